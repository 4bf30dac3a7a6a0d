use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;
use thirtyfour::ChromeCapabilities;

pub struct E2eOptions {
    pub chromedriver_url: String,
    pub extension_path: String,
    pub headless: bool,
}

pub fn run_e2e(opts: E2eOptions) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    runtime.block_on(run_e2e_async(opts))
}

async fn run_e2e_async(opts: E2eOptions) -> Result<(), String> {
    let extension_path = canonicalize_path(&opts.extension_path)?;

    let mut args = vec![
        format!("--disable-extensions-except={}", extension_path.display()),
        format!("--load-extension={}", extension_path.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];
    if opts.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }

    let mut caps = ChromeCapabilities::new();
    for arg in &args {
        caps.add_arg(arg)
            .map_err(|e| format!("Failed to set chrome arg: {}", e))?;
    }

    let driver = WebDriver::new(&opts.chromedriver_url, caps)
        .await
        .map_err(|e| format!("Failed to connect to chromedriver: {}", e))?;

    let cdp = ChromeDevTools::new(driver.handle.clone());
    tokio::time::sleep(Duration::from_secs(1)).await;

    let Some(extension_id) = find_extension_id(&cdp).await else {
        driver.quit().await.ok();
        return Err("Failed to locate extension service worker".to_string());
    };
    let popup = format!("chrome-extension://{}/popup/popup.html", extension_id);

    let mut errors = Vec::new();

    if let Err(e) = check_wasm_ready(&driver, &popup).await {
        errors.push(format!("Popup wasm check failed: {}", e));
    }

    if let Err(e) = check_origin_resolution(&driver, &popup).await {
        errors.push(format!("Origin resolution failed: {}", e));
    }

    if let Err(e) = check_protocol(&driver, &popup).await {
        errors.push(format!("Protocol checks failed: {}", e));
    }

    if let Err(e) = check_untouched_page(&driver).await {
        errors.push(format!("Untouched page check failed: {}", e));
    }

    driver.quit().await.ok();

    if errors.is_empty() {
        println!("✓ E2E checks passed");
        Ok(())
    } else {
        Err(format!("E2E failed:\n- {}", errors.join("\n- ")))
    }
}

async fn find_extension_id(cdp: &ChromeDevTools) -> Option<String> {
    let targets = cdp.execute_cdp("Target.getTargets").await.ok()?;
    let infos = targets.get("targetInfos")?.as_array()?;
    for info in infos {
        let target_type = info.get("type").and_then(Value::as_str).unwrap_or("");
        let url = info.get("url").and_then(Value::as_str).unwrap_or("");
        let background = target_type == "service_worker" || target_type == "background_page";
        if background && url.starts_with("chrome-extension://") {
            let id = url.trim_start_matches("chrome-extension://");
            if let Some(id) = id.split('/').next() {
                if !id.is_empty() {
                    return Some(id.to_string());
                }
            }
        }
    }
    None
}

async fn check_wasm_ready(driver: &WebDriver, popup: &str) -> Result<(), String> {
    driver.goto(popup).await.map_err(|e| format!("Failed to open popup: {}", e))?;
    let ready = eval(driver, "return window.wasm?.is_ready?.() ?? false;")
        .await
        .map_err(|e| format!("Failed to read wasm state: {}", e))?;
    if ready.as_bool() != Some(true) {
        return Err("WASM module not initialized".to_string());
    }
    Ok(())
}

async fn check_origin_resolution(driver: &WebDriver, popup: &str) -> Result<(), String> {
    driver.goto(popup).await.map_err(|e| format!("Failed to open popup: {}", e))?;

    let cases = [
        ("HTTPS://Example.COM:443/a?b#c", Some("https://example.com")),
        ("http://example.com:8080/", Some("http://example.com:8080")),
        ("chrome://extensions", None),
        ("not a url", None),
    ];

    for (input, expected) in cases {
        let script = format!(
            "return window.wasm?.resolve_origin_js?.({}) ?? null;",
            Value::String(input.to_string())
        );
        let result = eval(driver, &script)
            .await
            .map_err(|e| format!("Failed to resolve '{}': {}", input, e))?;
        if result.as_str() != expected {
            return Err(format!("'{}' resolved to {}, expected {:?}", input, result, expected));
        }
    }
    Ok(())
}

async fn check_protocol(driver: &WebDriver, popup: &str) -> Result<(), String> {
    driver.goto(popup).await.map_err(|e| format!("Failed to open popup: {}", e))?;

    let origins = eval(
        driver,
        "return window.wasm.handle_message({ type: 'getEnabledOrigins' });",
    )
    .await
    .map_err(|e| format!("getEnabledOrigins failed: {}", e))?;
    if !origins.get("origins").is_some_and(Value::is_array) {
        return Err(format!("Unexpected getEnabledOrigins response: {}", origins));
    }

    let unknown = eval(driver, "return window.wasm.handle_message({ type: 'bogus' });")
        .await
        .map_err(|e| format!("Unknown message failed: {}", e))?;
    if !unknown.get("error").is_some_and(Value::is_string) {
        return Err(format!("Expected an error response, got {}", unknown));
    }

    Ok(())
}

async fn check_untouched_page(driver: &WebDriver) -> Result<(), String> {
    driver.goto("https://example.com")
        .await
        .map_err(|e| format!("Failed to navigate to example.com: {}", e))?;
    let applied = eval(driver, "return window.__reclaimOverridesApplied === true;")
        .await
        .map_err(|e| format!("Failed to read injection marker: {}", e))?;
    if applied.as_bool() == Some(true) {
        return Err("Payload ran on an origin that was never enabled".to_string());
    }
    Ok(())
}

async fn eval(driver: &WebDriver, script: &str) -> WebDriverResult<Value> {
    let result = driver.execute(script, Vec::<Value>::new()).await?;
    Ok(result.json().clone())
}

fn canonicalize_path(path: &str) -> Result<PathBuf, String> {
    std::fs::canonicalize(path)
        .map_err(|e| format!("Failed to resolve '{}': {}", path, e))
}
