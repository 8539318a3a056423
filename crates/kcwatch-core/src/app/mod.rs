//! App - アプリケーション層
//!
//! ports を組み合わせて watchdog の制御ループを実装します。
//!
//! # 主要コンポーネント
//! - **PollLoop**: list → detect → restart を一定間隔で繰り返す
//! - **Spawner**: fan-out したワークの起動方針（fire-and-forget / tracked）
//! - **CycleReport**: 1 サイクルの起動結果

pub mod poll_loop;
pub mod report;
pub mod spawner;

pub use self::poll_loop::{PollLoop, check_connector, restart};
pub use self::report::{CycleOutcome, CycleReport};
pub use self::spawner::Spawner;
