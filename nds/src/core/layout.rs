//! File layout conventions for generated data.

/// Tables produced by `dsdgen`.
pub const TPCDS_TABLES: &[&str] = &[
    "call_center",
    "catalog_page",
    "catalog_returns",
    "catalog_sales",
    "customer",
    "customer_address",
    "customer_demographics",
    "date_dim",
    "dbgen_version",
    "household_demographics",
    "income_band",
    "inventory",
    "item",
    "promotion",
    "reason",
    "ship_mode",
    "store",
    "store_returns",
    "store_sales",
    "time_dim",
    "warehouse",
    "web_page",
    "web_returns",
    "web_sales",
    "web_site",
];

/// Name of one partition file: `<table>_<child>_<parallel>.dat`.
pub fn partition_file_name(table: &str, child: u32, parallel: u32) -> String {
    format!("{table}_{child}_{parallel}.dat")
}

/// All partition file names a `parallel`-way generation produces for `table`.
pub fn partition_file_names(table: &str, parallel: u32) -> impl Iterator<Item = String> + '_ {
    (1..=parallel).map(move |child| partition_file_name(table, child, parallel))
}

/// Format a byte count the way `du -h` does (1024-based, one decimal).
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["K", "M", "G", "T", "P"];
    if bytes < 1024 {
        return format!("{bytes}B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}", UNITS[unit])
}
