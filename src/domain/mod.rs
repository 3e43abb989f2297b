//! Domain Layer - Core copy-trading logic
//!
//! Pure types and decision logic with no network access. All external
//! interactions happen through the ports layer.
//!
//! - `snapshot`: Wallet holdings at a point in time
//! - `classifier`: Snapshot delta -> trade event
//! - `transaction`: Parsed transaction records
//! - `extractor`: Transaction record -> swap legs
//! - `position`: EverCopied set and open positions

pub mod snapshot;
pub mod trade_event;
pub mod classifier;
pub mod transaction;
pub mod extractor;
pub mod position;

pub use snapshot::{Snapshot, LAMPORTS_PER_SOL, SOL_MINT};
pub use trade_event::{Direction, TradeEvent};
pub use classifier::{classify, classify_with_base, ClassifierConfig, DeltaClassifier};
pub use transaction::{TokenTransfer, TransactionRecord};
pub use extractor::{looks_like_swap, ExtractedSwap, SwapExtractor};
pub use position::{AssetState, Position, PositionError, PositionTracker};
