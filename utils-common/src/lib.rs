pub mod compression;
pub mod models;
pub mod taxonomy;

// 重新导出常用类型和函数
pub use compression::{from_compressed, to_compressed, CodecError};
pub use models::{Article, Dimension, StoredArticle};
pub use taxonomy::Taxonomy;
