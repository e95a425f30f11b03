// src/bin/phonecat.rs

use anyhow::{anyhow, bail, Context};
use phone_catalog::client::{pretty_sql, Envelope, SearchQuery};
use phone_catalog::domain::catalog::PhoneSummary;
use phone_catalog::domain::query::SortOrder;
use phone_catalog::{CatalogClient, ComparisonTable, FilterCriteria};
use serde_json::{Map, Value as JsonValue};

const DEFAULT_API_URL: &str = "http://localhost:3001";

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: phonecat [--url URL] <command> [options]\n\
         \n\
         Commands:\n\
           list     [--page N] [--limit N]\n\
           filters\n\
           search   [--brand NAME] [--chipset NAME] [--display-type NAME]\n\
                    [--min-storage GB] [--min-ram GB] [--min-battery MAH]\n\
                    [--price-min X] [--price-max X] [--screen-min X] [--screen-max X]\n\
                    [--sort-by COLUMN] [--order asc|desc] [--page N] [--limit N]\n\
           show     ID\n\
           compare  ID ID [ID...]\n\
         \n\
         The API URL defaults to $CATALOG_API_URL, then {}.\n",
        DEFAULT_API_URL
    );
    std::process::exit(2);
}

/// `--flag value` pairs plus bare positional arguments.
struct Args {
    flags: Vec<(String, String)>,
    positional: Vec<String>,
}

impl Args {
    fn parse(raw: &[String]) -> anyhow::Result<Self> {
        let mut flags = Vec::new();
        let mut positional = Vec::new();
        let mut iter = raw.iter();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--{} needs a value", name))?;
                flags.push((name.to_string(), value.clone()));
            } else {
                positional.push(arg.clone());
            }
        }
        Ok(Self { flags, positional })
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn number<T: std::str::FromStr>(&self, name: &str) -> anyhow::Result<Option<T>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| anyhow!("--{} expects a number, got {:?}", name, raw)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.is_empty() || raw.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let args = Args::parse(&raw)?;
    let Some((command, rest)) = args.positional.split_first() else {
        usage_and_exit();
    };

    let base_url = args
        .get("url")
        .map(str::to_string)
        .or_else(|| std::env::var("CATALOG_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let client = CatalogClient::new(base_url)?;

    match command.as_str() {
        "list" => {
            let page = args.number("page")?.unwrap_or(1);
            let limit = args.number("limit")?.unwrap_or(20);
            let res = client.list_devices(page, limit).await?;
            print_phones(&res.data.devices);
            println!(
                "\nPage {} of {} ({} phones)",
                res.data.pagination.page,
                res.data.pagination.total_pages,
                res.data.pagination.total
            );
            print_sql(&res);
        }
        "filters" => {
            let res = client.filter_options().await?;
            let opts = &res.data;
            let names = |v: Vec<&str>| v.join(", ");
            println!(
                "Brands:        {}",
                names(opts.brands.iter().map(|b| b.brand_name.as_str()).collect())
            );
            println!(
                "Chipsets:      {}",
                names(opts.chipsets.iter().map(|c| c.chipset_name.as_str()).collect())
            );
            println!(
                "Display types: {}",
                names(opts.display_types.iter().map(|d| d.display_type_name.as_str()).collect())
            );
            println!(
                "Storage (GB):  {}",
                opts.storage_options
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
            );
            println!("Price range:   ${} - ${}", opts.price_range.min, opts.price_range.max);
            print_sql(&res);
        }
        "search" => {
            let query = search_query(&args)?;
            let res = client.search_phones(&query).await?;
            print_phones(&res.data.phones);
            println!(
                "\nPage {} of {} ({} matches), sorted by {} {}",
                res.data.pagination.page,
                res.data.pagination.total_pages,
                res.data.pagination.total,
                res.data.sorting.sort_by,
                res.data.sorting.sort_order.as_str()
            );
            print_sql(&res);
        }
        "show" => {
            let id = parse_id(rest.first().map(String::as_str))?;
            let res = client.phone_details(id).await?;
            let pretty = serde_json::to_string_pretty(&res.data.phone)?;
            println!("{}", pretty);
            print_sql(&res);
        }
        "compare" => {
            if rest.len() < 2 {
                bail!("compare needs at least two phone ids");
            }
            let mut phones: Vec<Map<String, JsonValue>> = Vec::with_capacity(rest.len());
            for raw_id in rest {
                let id = parse_id(Some(raw_id))?;
                let res = client.phone_details(id).await?;
                match res.data.phone {
                    JsonValue::Object(map) => phones.push(map),
                    other => bail!("phone {} came back as {}", id, other),
                }
            }
            print_comparison(&ComparisonTable::build(&phones));
        }
        other => {
            eprintln!("Unknown command: {}", other);
            usage_and_exit();
        }
    }
    Ok(())
}

fn search_query(args: &Args) -> anyhow::Result<SearchQuery> {
    let mut criteria = FilterCriteria::default();
    if let Some(brand) = args.get("brand") {
        criteria = criteria.with_brand(brand);
    }
    if let Some(chipset) = args.get("chipset") {
        criteria = criteria.with_chipset(chipset);
    }
    if let Some(display_type) = args.get("display-type") {
        criteria = criteria.with_display_type(display_type);
    }
    if let Some(gb) = args.number("min-storage")? {
        criteria = criteria.with_min_internal_storage_gb(gb);
    }
    if let Some(gb) = args.number("min-ram")? {
        criteria = criteria.with_min_ram_gb(gb);
    }
    if let Some(mah) = args.number("min-battery")? {
        criteria = criteria.with_min_battery_capacity(mah);
    }
    criteria = criteria
        .with_price_range(args.number("price-min")?, args.number("price-max")?)
        .with_screen_size_range(args.number("screen-min")?, args.number("screen-max")?);

    let sort_order = match args.get("order") {
        None => None,
        Some(raw) => Some(
            SortOrder::parse(raw).ok_or_else(|| anyhow!("--order must be asc or desc"))?,
        ),
    };

    Ok(SearchQuery {
        filters: criteria,
        sort_by: args.get("sort-by").map(str::to_string),
        sort_order,
        page: args.number("page")?,
        limit: args.number("limit")?,
    })
}

fn parse_id(raw: Option<&str>) -> anyhow::Result<i64> {
    let raw = raw.ok_or_else(|| anyhow!("missing phone id"))?;
    raw.parse::<i64>()
        .with_context(|| format!("phone id must be an integer, got {:?}", raw))
}

fn print_phones(phones: &[PhoneSummary]) {
    if phones.is_empty() {
        println!("No phones found.");
        return;
    }
    println!(
        "{:>6}  {:<32} {:>5} {:>7} {:>8} {:>6} {:>10}",
        "ID", "Phone", "RAM", "Storage", "Battery", "Screen", "Price"
    );
    for p in phones {
        let name = format!("{} {}", p.brand_name, p.model);
        let price = p.price_unofficial.or(p.price_official);
        println!(
            "{:>6}  {:<32} {:>5} {:>7} {:>8} {:>6} {:>10}",
            p.phone_id,
            truncate(&name, 32),
            p.ram_gb.map(|v| format!("{}GB", v)).unwrap_or_else(|| "-".into()),
            p.internal_storage_gb.map(|v| format!("{}GB", v)).unwrap_or_else(|| "-".into()),
            p.battery_capacity.map(|v| format!("{}mAh", v)).unwrap_or_else(|| "-".into()),
            p.screen_size.map(|v| format!("{}\"", v)).unwrap_or_else(|| "-".into()),
            price.map(|v| format!("${:.2}", v)).unwrap_or_else(|| "-".into()),
        );
    }
}

fn print_comparison(table: &ComparisonTable) {
    let label_width = table.rows.iter().map(|r| r.label.len()).max().unwrap_or(0) + 2;
    let col_width = table
        .headers
        .iter()
        .map(|h| h.len())
        .chain(table.rows.iter().flat_map(|r| r.values.iter().map(|v| v.len())))
        .max()
        .unwrap_or(0)
        + 2;

    print!("  {:<label_width$}", "");
    for header in &table.headers {
        print!("{:<col_width$}", header);
    }
    println!();

    let mut category = "";
    for row in &table.rows {
        if row.category != category {
            category = row.category;
            println!("[{}]", category);
        }
        let marker = if row.differs { '*' } else { ' ' };
        print!("{} {:<label_width$}", marker, row.label);
        for value in &row.values {
            print!("{:<col_width$}", value);
        }
        println!();
    }
    println!("\n* values differ");
}

fn print_sql<T>(res: &Envelope<T>) {
    if let Some(sql) = &res.sql_query {
        println!("\n-- SQL ({:.2} ms)", res.execution_time.unwrap_or_default());
        println!("{}", pretty_sql(sql));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
