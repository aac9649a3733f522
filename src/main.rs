//! # filter - 正则过滤工具
//!
//! 对普通文件、目录树和 `.zip` / `.gz` 归档执行正则筛选或替换。
//! 归档经并发流水线重建为单个 zip。
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (按输入类型分派)
//!   │     ├── transform.rs (正则变换)
//!   │     ├── pipeline/    (归档重建流水线)
//!   │     └── batch/       (目录批处理)
//!   ├── utils/      (输出与进度条)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod pipeline;
mod transform;
mod utils;

use clap::{CommandFactory, Parser};
use cli::Cli;
use pipeline::CancelToken;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if cli.regex.is_empty() {
        Cli::command().print_help().ok();
        std::process::exit(2);
    }

    utils::output::set_quiet(cli.quiet);

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        utils::output::print_warning(&format!("Cannot install Ctrl-C handler: {}", e));
    }

    if let Err(e) = commands::run(cli, &cancel) {
        utils::output::print_error(&e.chain());
        std::process::exit(1);
    }
}
