pub mod corrector;
pub mod differ;
pub mod normalizer;
pub mod scorer;
pub mod segmenter;

pub use corrector::{CorrectionStep, GrammarCorrection, SpellingCorrection, TextCorrector};
pub use differ::{LiteralSplitter, PunctuationSplitter, SentenceDiffer, SentenceSplitter};
pub use normalizer::TextNormalizer;
pub use scorer::{cosine_similarity, ScoreOutcome, SimilarityScorer};
pub use segmenter::WordSegmenter;
