use std::path::{Path, PathBuf};

use indicatif::ProgressStyle;
use log::info;
use regex::Regex;
use walkdir::WalkDir;

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>6}/{len:6} {wide_msg}",
    )
    .expect("invalid progress template")
    .progress_chars("##-")
}

/// 递归扫描目录，返回后缀匹配的文件，按路径排序
pub fn scan_directory(path: impl AsRef<Path>, re_suf: &Regex) -> Vec<PathBuf> {
    info!("开始扫描目录: {}", path.as_ref().display());
    let mut entries = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| {
            entry.ok().and_then(|entry| {
                let path = entry.path();
                if path.is_file() {
                    if let Some(ext) = path.extension() {
                        if re_suf.is_match(&ext.to_string_lossy()) {
                            return Some(path.to_path_buf());
                        }
                    }
                }
                None
            })
        })
        .collect::<Vec<_>>();
    entries.sort();
    info!("扫描完成，共 {} 个文件", entries.len());
    entries
}
