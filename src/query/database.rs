use crate::error::ResultMessage;
use crate::error::RustyReportError;
use crate::helpers::process::run_command;
use crate::query::Dataset;
use crate::query::QueryError;
use crate::query::QueryResult;
use crate::query::QueryService;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveTime;
use duckdb::types::TimeUnit;
use duckdb::types::Value;
use duckdb::Connection;
use std::time::Duration;
use tracing::debug;
use tracing::info;

const IN_MEMORY: &str = ":memory:";

/// Days between 0001-01-01 (CE day 1) and the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Where the SQL for a prompt comes from
#[derive(Clone, Debug, PartialEq)]
pub enum SqlSource {
    /// The prompt is the SQL statement
    Literal,
    /// The prompt is written to a generator command whose stdout is the SQL statement
    Command { command: Vec<String>, timeout: Duration },
}

/// Query service running SQL against a DuckDB database
pub struct DuckDbQueryService {
    connection: Connection,
    source: SqlSource,
}

impl DuckDbQueryService {
    /// Opens `database` (a file path or `:memory:`) and runs each `init_sql` batch once.
    pub fn open(database: &str, init_sql: &[String], source: SqlSource) -> Result<Self, RustyReportError> {
        let connection = if database.is_empty() || database == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(database)
                .map_err(RustyReportError::from)
                .with_prefix(&format!("Open database '{}'", database))?
        };
        for statement in init_sql {
            connection
                .execute_batch(statement)
                .map_err(RustyReportError::from)
                .with_prefix(&format!("Run init SQL '{}'", statement))?;
        }
        debug!(database = database, init_statements = init_sql.len(), "Opened DuckDB query service");
        Ok(Self { connection, source })
    }

    /// Runs one SQL statement and collects its result as text
    pub fn run(&self, sql: &str) -> Result<Dataset, RustyReportError> {
        let mut statement = self.connection.prepare(sql)?;
        let mut rows = statement.query([])?;
        let columns = rows.as_ref().map(|statement| statement.column_names()).unwrap_or_default();

        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                record.push(render_value(row.get::<_, Value>(index)?));
            }
            values.push(record);
        }
        Ok(Dataset::new(columns, values)?)
    }

    fn statement_for(&self, prompt: &str) -> Result<String, RustyReportError> {
        match &self.source {
            SqlSource::Literal => Ok(prompt.to_owned()),
            SqlSource::Command { command, timeout } => {
                let output = run_command(command, prompt.as_bytes(), *timeout)?;
                let statement = strip_code_fence(&output.stdout);
                if statement.is_empty() {
                    Err(QueryError::EmptyStatement(prompt.to_owned()))?
                }
                Ok(statement.to_owned())
            }
        }
    }
}

impl QueryService for DuckDbQueryService {
    fn fetch(&self, prompt: &str) -> Result<QueryResult, RustyReportError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            Err(QueryError::EmptyPrompt)?
        }
        let query = self.statement_for(prompt)?;
        let dataset = self.run(&query).with_prefix(&format!("Run query '{}'", query))?;
        info!(columns = dataset.column_count(), rows = dataset.row_count(), "Fetched dataset");
        Ok(QueryResult { query, dataset })
    }
}

/// Removes a surrounding Markdown code fence (```sql ... ```) from generated SQL
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string on the opening line
    let inner = inner.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    inner.trim_end().trim_end_matches("```").trim()
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value * 1_000_000,
        TimeUnit::Millisecond => value * 1_000,
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// Renders a DuckDB value as cell text; NULL becomes an empty cell
fn render_value(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Boolean(value) => value.to_string(),
        Value::TinyInt(value) => value.to_string(),
        Value::SmallInt(value) => value.to_string(),
        Value::Int(value) => value.to_string(),
        Value::BigInt(value) => value.to_string(),
        Value::HugeInt(value) => value.to_string(),
        Value::UTinyInt(value) => value.to_string(),
        Value::USmallInt(value) => value.to_string(),
        Value::UInt(value) => value.to_string(),
        Value::UBigInt(value) => value.to_string(),
        Value::Float(value) => value.to_string(),
        Value::Double(value) => value.to_string(),
        Value::Decimal(value) => value.to_string(),
        Value::Text(value) | Value::Enum(value) => value,
        Value::Blob(bytes) => bytes.iter().map(|byte| format!("{:02x}", byte)).collect(),
        Value::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
            .map(|date| date.to_string())
            .unwrap_or_else(|| days.to_string()),
        Value::Timestamp(unit, value) => {
            let micros = to_micros(unit, value);
            DateTime::from_timestamp_micros(micros)
                .map(|datetime| datetime.naive_utc().to_string())
                .unwrap_or_else(|| micros.to_string())
        }
        Value::Time64(unit, value) => {
            let micros = to_micros(unit, value);
            let seconds = (micros / 1_000_000) as u32;
            let nanos = (micros % 1_000_000) as u32 * 1_000;
            NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
                .map(|time| time.to_string())
                .unwrap_or_else(|| micros.to_string())
        }
        Value::List(values) | Value::Array(values) => {
            let values: Vec<String> = values.into_iter().map(render_value).collect();
            format!("[{}]", values.join(", "))
        }
        other => format!("{:?}", other),
    }
}
