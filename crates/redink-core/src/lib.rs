pub mod finding;
pub mod lexicon;
pub mod markup;
pub mod merge;
pub mod state;

pub use finding::{Finding, RiskCategory, Verdict, renumber};
pub use lexicon::{Lexicon, LexiconError};
pub use merge::{MatchOutcome, Merged, merge};
pub use state::{AnalysisState, Annotated, Identified, Pending};
