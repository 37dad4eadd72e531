use thiserror::Error;

/// 应用程序错误类型
///
/// 注意：启发式匹配失败（找不到字段、找不到选项、抽取不到岗位）不是错误，
/// 它们以 `bool` / `Option` 的形式返回，只有真正的运行时故障才会走到这里。
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 页面模型错误
    #[error("页面错误: {0}")]
    Dom(#[from] DomError),
    /// 档案数据错误
    #[error("档案错误: {0}")]
    Profile(#[from] ProfileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 页面快照无法解析
    #[error("页面快照无法解析: {reason}")]
    SnapshotInvalid { reason: String },
}

/// 页面模型错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// 节点不存在
    #[error("节点 #{0} 不存在")]
    NodeNotFound(usize),
    /// 节点已从文档中移除
    #[error("节点 #{0} 已脱离文档")]
    Detached(usize),
    /// 节点类型不支持该操作
    #[error("节点 #{node} <{tag}> 不支持操作: {operation}")]
    Unsupported {
        node: usize,
        tag: String,
        operation: &'static str,
    },
}

/// 档案数据错误
#[derive(Debug, Error)]
pub enum ProfileError {
    /// 档案文件读取失败
    #[error("读取档案失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("档案 JSON 解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    /// 档案不是对象
    #[error("档案必须是 JSON 对象")]
    NotAnObject,
    /// 档案为空
    #[error("档案为空")]
    Empty,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 关键字文件读取失败
    #[error("读取关键字文件失败 ({path}): {source}")]
    KeywordFileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Profile(ProfileError::Parse(err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建快照解析错误
    pub fn snapshot_invalid(reason: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::SnapshotInvalid {
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
