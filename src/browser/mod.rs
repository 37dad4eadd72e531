//! 浏览器连接
//!
//! - `connection` - 通过调试端口接管已运行的浏览器
//! - `headless` - 自行启动无头浏览器

pub mod connection;
pub mod headless;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_headless_browser;
