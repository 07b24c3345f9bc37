/// Logs to the browser console on wasm32, through `log` elsewhere
pub fn console_log(msg: impl AsRef<str>) {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::console::log_1(&msg.as_ref().into());
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        log::debug!("{}", msg.as_ref());
    }
}

pub fn console_warn(msg: impl AsRef<str>) {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::console::warn_1(&msg.as_ref().into());
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        log::warn!("{}", msg.as_ref());
    }
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Monotonic-enough timestamp for `[perf]` lines, in milliseconds
pub fn perf_now() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::sync::OnceLock;
        use std::time::Instant;
        static START: OnceLock<Instant> = OnceLock::new();
        START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
    }
}
