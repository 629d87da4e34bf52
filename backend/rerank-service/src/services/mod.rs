pub mod diversity;

pub use diversity::{
    build_reranker, BinomialCoverage, CombSum, LambdaReranker, Mmr, RandomReranker, Reranker,
    RerankerConfig, XQuad,
};
