//! SDK 版本与构建元信息
//!
//! - SDK 版本 → Cargo.toml
//! - 数据库 schema 版本 → migrations/ 文件名（refinery 管理）

/// SDK semver，来自 Cargo.toml
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 构建时间（由 vergen 在 build.rs 中生成）
pub const BUILD_TIME: &str = env!("VERGEN_BUILD_TIMESTAMP");

/// 当前 SDK 支持的最高 schema 版本。
/// 由 build.rs 扫描 migrations/ 下 V{version}__*.sql 取最大值生成；库里的版本高于此值时拒绝打开。
pub const SDK_DB_VERSION: i64 = parse_db_version(env!("SDK_DB_VERSION"));

const fn parse_db_version(s: &str) -> i64 {
    let b = s.as_bytes();
    let mut v = 0i64;
    let mut i = 0usize;
    while i < b.len() {
        if b[i].is_ascii_digit() {
            v = v * 10 + (b[i] - b'0') as i64;
        }
        i += 1;
    }
    v
}
