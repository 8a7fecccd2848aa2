use crate::commands::CmdResult;
use crate::error::Result;
use crate::model::Expense;
use crate::store::ExpenseStore;
use std::collections::BTreeMap;

/// Display aggregation over a record set.
///
/// Prices are summed as `f64`; records whose price does not parse are counted
/// in `unparsed` and left out of every total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub total: f64,
    pub unparsed: usize,
    /// Per coffee type totals, sorted by type name.
    pub by_type: Vec<TypeTotal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeTotal {
    pub kind: String,
    pub count: usize,
    pub total: f64,
}

impl Summary {
    pub fn from_records(records: &[Expense]) -> Self {
        let mut summary = Summary {
            count: records.len(),
            ..Summary::default()
        };
        let mut by_type: BTreeMap<&str, (usize, f64)> = BTreeMap::new();

        for expense in records {
            let entry = by_type.entry(expense.kind.trim()).or_default();
            entry.0 += 1;
            match expense.price_amount() {
                Some(amount) => {
                    summary.total += amount;
                    entry.1 += amount;
                }
                None => summary.unparsed += 1,
            }
        }

        summary.by_type = by_type
            .into_iter()
            .map(|(kind, (count, total))| TypeTotal {
                kind: kind.to_string(),
                count,
                total,
            })
            .collect();
        summary
    }

    /// Mean over the records with a parseable price.
    pub fn average(&self) -> Option<f64> {
        let priced = self.count - self.unparsed;
        (priced > 0).then(|| self.total / priced as f64)
    }
}

pub fn run<S: ExpenseStore>(store: &S) -> Result<CmdResult> {
    let snapshot = store.load_snapshot()?;
    Ok(CmdResult::default().with_summary(Summary::from_records(&snapshot.records)))
}
