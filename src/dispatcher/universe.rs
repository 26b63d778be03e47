use anyhow::{bail, Result};

use super::App;
use crate::cli::formatters::{format_saved, format_section, format_universe_meta};
use crate::reports::ReportTable;
use crate::universe::{self, Constituent};

pub async fn dispatch_refresh(app: &App) -> Result<()> {
    if app.offline {
        bail!("Network access is disabled; cannot refresh the S&P 500 list");
    }
    let list = universe::refresh(&app.config.universe, &app.config.provider).await?;
    let dir = universe::cache_dir(&app.config.universe)?;
    println!(
        "{}",
        format_saved(&format!("{} S&P 500 constituents", list.len()), &dir)
    );
    Ok(())
}

pub fn dispatch_show(app: &App, limit: Option<usize>) -> Result<()> {
    let dir = universe::cache_dir(&app.config.universe)?;
    let meta = universe::read_meta(&dir)?;
    println!("{}", format_universe_meta(meta.as_ref(), app.as_of));
    if meta.is_none() {
        return Ok(());
    }

    let list = universe::load_cached(&dir)?;
    let table = constituent_table(&list);
    let table = match limit {
        Some(n) => table.truncated(n),
        None => table,
    };
    println!("{}", format_section("S&P 500 constituents", &table));
    Ok(())
}

fn constituent_table(list: &[Constituent]) -> ReportTable {
    let mut table = ReportTable::new(["Symbol", "Security", "Sector"]);
    for c in list {
        table.push_row(vec![c.symbol.clone(), c.security.clone(), c.sector.clone()]);
    }
    table
}
