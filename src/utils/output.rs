//! # 美化输出工具
//!
//! 提供统一的终端输出样式。`--quiet` 时只保留错误输出。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块使用
//! - 使用 `colored` crate

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// 设置静默模式
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

/// 是否处于静默模式
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// 打印成功消息
pub fn print_success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "[OK]".green().bold(), msg);
    }
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "[WARN]".yellow().bold(), msg);
    }
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "[*]".blue().bold(), msg);
    }
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "[DONE]".green().bold(), msg);
    }
}

/// 打印转换结果
pub fn print_conversion(from: &str, to: &str) {
    if !is_quiet() {
        println!(
            "{} {} {} {}",
            "[OK]".green().bold(),
            from.dimmed(),
            "->".cyan(),
            to
        );
    }
}

/// 打印标题栏
pub fn print_header(title: &str) {
    if is_quiet() {
        return;
    }
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    if !is_quiet() {
        println!("{}", "─".repeat(60).dimmed());
    }
}
