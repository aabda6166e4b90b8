use std::cell::RefCell;
use wasm_bindgen::prelude::*;

// This allows us to access console.log from JS
#[wasm_bindgen]
extern "C" {
    // Use `js_namespace` to bind `console.log(..)` instead of just `log(..)`
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    pub fn warn(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn error(s: &str);
}

// Note: The console_log macro is defined in lib.rs to avoid duplication

/// Destination for the advisory diagnostics produced while flattening,
/// simplifying and editing features.
///
/// Nothing in the geometry code writes to a global logger; callers hand in a
/// sink. The wasm entry points use [`ConsoleSink`], tests use [`MemorySink`].
pub trait LogSink {
    fn log(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards diagnostics to the browser console.
///
/// Imported JS functions cannot be called outside of wasm, so on native
/// targets this sink drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    #[cfg(target_arch = "wasm32")]
    fn log(&self, message: &str) {
        log(message);
    }

    #[cfg(target_arch = "wasm32")]
    fn warn(&self, message: &str) {
        warn(message);
    }

    #[cfg(target_arch = "wasm32")]
    fn error(&self, message: &str) {
        error(message);
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn log(&self, _message: &str) {}

    #[cfg(not(target_arch = "wasm32"))]
    fn warn(&self, _message: &str) {}

    #[cfg(not(target_arch = "wasm32"))]
    fn error(&self, _message: &str) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Keeps every line in memory, prefixed with its level ("log: ", "warn: ",
/// "error: ").
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: RefCell<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter_map(|line| line.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }

    fn push(&self, level: &str, message: &str) {
        self.lines.borrow_mut().push(format!("{}: {}", level, message));
    }
}

impl LogSink for MemorySink {
    fn log(&self, message: &str) {
        self.push("log", message);
    }

    fn warn(&self, message: &str) {
        self.push("warn", message);
    }

    fn error(&self, message: &str) {
        self.push("error", message);
    }
}
