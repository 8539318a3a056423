//! Ports - 抽象化レイヤー
//!
//! 外部システム（管理 REST API）へのインターフェースを trait で定義し、
//! app 層から実装の詳細を隠蔽します。

pub mod connect_api;

pub use self::connect_api::ConnectApi;
