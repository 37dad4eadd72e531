//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行脚本 / 调用页面函数"的能力

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::utils::logging::truncate_text;

/// JS 执行器
///
/// 不认识字段、档案、岗位，只负责把脚本送进页面、把 JSON 结果带回来。
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 页面当前 URL
    pub async fn current_url(&self) -> Result<Option<String>> {
        self.page.url().await.context("读取页面 URL 失败")
    }

    /// 执行表达式并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let js_code = js_code.into();
        debug!("执行脚本: {}", truncate_text(&js_code, 80));
        let result = self
            .page
            .evaluate(js_code)
            .await
            .context("页面脚本执行失败")?;
        result.into_value().context("脚本返回值不是 JSON")
    }

    /// 执行表达式并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).context("脚本返回值结构不符")
    }

    /// 以 JSON 参数调用一段函数源码
    ///
    /// # 参数
    /// - `function`: 单参数函数表达式的源码
    /// - `arg`: 序列化后作为唯一实参传入
    ///
    /// # 返回
    /// 函数返回值反序列化后的类型
    pub async fn call_as<A, T>(&self, function: &str, arg: &A) -> Result<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.eval_as(invocation(function, arg)?).await
    }
}

/// 拼出 `(function)(arg)` 调用表达式
fn invocation<A: Serialize + ?Sized>(function: &str, arg: &A) -> Result<String> {
    let payload = serde_json::to_string(arg).context("序列化脚本参数失败")?;
    Ok(format!("({})({})", function.trim(), payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_embeds_json_argument() {
        let js = invocation(" function (xs) { return xs.length; } ", &[1, 2, 3]).unwrap();
        assert_eq!(js, "(function (xs) { return xs.length; })([1,2,3])");

        let js = invocation("function (s) { return s; }", "a\"b").unwrap();
        assert!(js.ends_with(r#"("a\"b")"#));
    }
}
