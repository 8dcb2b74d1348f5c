use crate::args::ExportArgs;
use crate::commands::Out;
use crate::export::month_csv;
use crate::source::read_snapshots;
use crate::{utils, Config, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// The outcome of `staffdesk export`.
#[derive(Debug, Clone, Serialize)]
pub struct Exported {
    pub path: PathBuf,
    pub transactions: usize,
}

/// Writes the transactions of one month, newest first, to a CSV file. The file goes to
/// `args.out()` if given, otherwise to `<exports>/<year>-<month>.csv`, e.g. `2024-03.csv`.
pub async fn export(config: Config, args: &ExportArgs) -> Result<Out<Exported>> {
    let snapshots = read_snapshots(&config).await;
    let ledger = snapshots.ledger();
    let transactions = ledger.month(args.year(), args.month().key());
    let csv = month_csv(transactions)?;

    let path = match args.out() {
        Some(p) => p.to_path_buf(),
        None => config
            .exports()
            .join(format!("{}-{}.csv", args.year(), args.month())),
    };
    debug!("Writing {} transaction(s) to {}", transactions.len(), path.display());
    utils::write(&path, csv).await?;

    let exported = Exported {
        path,
        transactions: transactions.len(),
    };
    Ok(Out::new(
        format!(
            "Exported {} transaction(s) to '{}'",
            exported.transactions,
            exported.path.display()
        ),
        exported,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::YearKey;
    use crate::snapshot::SourceKey;
    use crate::test::TestEnv;
    use serde_json::json;

    #[tokio::test]
    async fn test_export_default_path() {
        let env = TestEnv::new().await;
        env.write_agency();
        let args = ExportArgs::new(YearKey::Year(2024), "3".parse().unwrap(), None);
        let out = export(env.config(), &args).await.unwrap();
        let exported = out.structure().unwrap();

        assert_eq!(exported.transactions, 3);
        assert_eq!(exported.path, env.config().exports().join("2024-03.csv"));
        let csv = std::fs::read_to_string(&exported.path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,kind,amount,note");
        assert_eq!(lines[1], "2024-03-15,discretionary,500.00,");
        assert_eq!(lines[2], "2024-03-12,investment,2000.00,Laptops");
        assert_eq!(lines[3], "2024-03-10,client,10000.00,March invoice");
    }

    #[tokio::test]
    async fn test_export_unknown_month_to_explicit_path() {
        let env = TestEnv::new().await;
        env.write_snapshot(
            SourceKey::Workers,
            json!([{"amount": 300, "date": "whenever", "remarks": "cash"}]),
        );
        let out_path = env.config().root().join("undated.csv");
        let args = ExportArgs::new(
            YearKey::Unknown,
            "unknown".parse().unwrap(),
            Some(out_path.clone()),
        );
        let out = export(env.config(), &args).await.unwrap();
        assert_eq!(out.structure().unwrap().transactions, 1);
        let csv = std::fs::read_to_string(&out_path).unwrap();
        assert!(csv.contains("whenever,workerPayroll,300.00,cash"));
    }

    #[tokio::test]
    async fn test_export_empty_month_writes_header() {
        let env = TestEnv::new().await;
        let args = ExportArgs::new(YearKey::Year(2020), "1".parse().unwrap(), None);
        let out = export(env.config(), &args).await.unwrap();
        let exported = out.structure().unwrap();
        assert_eq!(exported.transactions, 0);
        assert_eq!(
            std::fs::read_to_string(&exported.path).unwrap(),
            "date,kind,amount,note\n"
        );
    }
}
