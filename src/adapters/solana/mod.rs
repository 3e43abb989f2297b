pub mod rpc;
pub mod wallet;
pub mod logs_stream;

pub use rpc::SolanaClient;
pub use wallet::{decode_transaction, encode_transaction, WalletError, WalletManager};
pub use logs_stream::{LogNotification, LogsSubscriber, StreamError};
