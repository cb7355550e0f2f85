//! 基于 SQL state 的异常翻译
//!
//! 按 SQL state 的前两位（类别码）分类：
//!
//! | 类别码 | 翻译结果 |
//! |---|---|
//! | 07 21 2A 37 42 65 | `BadSqlGrammar` |
//! | 01 02 22 23 27 44 | `DataIntegrityViolation`（`23505` 及常见厂商唯一键冲突码为 `DuplicateKey`）|
//! | 08 53 54 57 58 | `DataAccessResourceFailure` |
//! | JW JZ S1 | `TransientDataAccessResource` |
//! | 40 61 | `ConcurrencyFailure` |

use std::error::Error as StdError;
use std::fmt;

use weave_core::Throwable;

use crate::error::DataAccessError;
use crate::translator::PersistenceExceptionTranslator;

const BAD_SQL_GRAMMAR_CODES: &[&str] = &["07", "21", "2A", "37", "42", "65"];
const DATA_INTEGRITY_VIOLATION_CODES: &[&str] = &["01", "02", "22", "23", "27", "44"];
const DATA_ACCESS_RESOURCE_FAILURE_CODES: &[&str] = &["08", "53", "54", "57", "58"];
const TRANSIENT_DATA_ACCESS_RESOURCE_CODES: &[&str] = &["JW", "JZ", "S1"];
const CONCURRENCY_FAILURE_CODES: &[&str] = &["40", "61"];

/// 唯一约束冲突的厂商错误码：MySQL 1062，SQL Server 2601/2627
const DUPLICATE_KEY_VENDOR_CODES: &[i32] = &[1062, 2601, 2627];
const DUPLICATE_KEY_SQL_STATE: &str = "23505";

/// 驱动层报告的 SQL 错误
#[derive(Debug, Clone)]
pub struct SqlError {
    pub sql_state: Option<String>,
    pub vendor_code: i32,
    pub message: String,
}

impl SqlError {
    pub fn new(sql_state: impl Into<String>, vendor_code: i32, message: impl Into<String>) -> Self {
        Self {
            sql_state: Some(sql_state.into()),
            vendor_code,
            message: message.into(),
        }
    }

    /// 没有 SQL state 的驱动错误
    pub fn without_state(vendor_code: i32, message: impl Into<String>) -> Self {
        Self {
            sql_state: None,
            vendor_code,
            message: message.into(),
        }
    }

    /// SQL state 的类别码
    pub fn class_code(&self) -> Option<&str> {
        self.sql_state.as_deref().and_then(|state| state.get(..2))
    }
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql_state {
            Some(state) => write!(
                f,
                "{} [SQLState: {}, vendor code: {}]",
                self.message, state, self.vendor_code
            ),
            None => write!(f, "{} [vendor code: {}]", self.message, self.vendor_code),
        }
    }
}

impl StdError for SqlError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqlStateCategory {
    BadSqlGrammar,
    DuplicateKey,
    DataIntegrityViolation,
    DataAccessResourceFailure,
    TransientDataAccessResource,
    ConcurrencyFailure,
}

fn classify(error: &SqlError) -> Option<SqlStateCategory> {
    let class_code = error.class_code()?;

    if BAD_SQL_GRAMMAR_CODES.contains(&class_code) {
        Some(SqlStateCategory::BadSqlGrammar)
    } else if DATA_INTEGRITY_VIOLATION_CODES.contains(&class_code) {
        let duplicate = error.sql_state.as_deref() == Some(DUPLICATE_KEY_SQL_STATE)
            || DUPLICATE_KEY_VENDOR_CODES.contains(&error.vendor_code);
        Some(if duplicate {
            SqlStateCategory::DuplicateKey
        } else {
            SqlStateCategory::DataIntegrityViolation
        })
    } else if DATA_ACCESS_RESOURCE_FAILURE_CODES.contains(&class_code) {
        Some(SqlStateCategory::DataAccessResourceFailure)
    } else if TRANSIENT_DATA_ACCESS_RESOURCE_CODES.contains(&class_code) {
        Some(SqlStateCategory::TransientDataAccessResource)
    } else if CONCURRENCY_FAILURE_CODES.contains(&class_code) {
        Some(SqlStateCategory::ConcurrencyFailure)
    } else {
        None
    }
}

/// 在错误及其 source 链上查找第一个带 SQL state 的 `SqlError`
fn find_sql_error<'a>(err: &'a (dyn StdError + Send + Sync + 'static)) -> Option<&'a SqlError> {
    let mut current: Option<&'a (dyn StdError + 'static)> = Some(err);
    while let Some(candidate) = current {
        if let Some(sql) = candidate.downcast_ref::<SqlError>() {
            if sql.sql_state.is_some() {
                return Some(sql);
            }
        }
        current = candidate.source();
    }
    None
}

/// 按 SQL state 翻译 `SqlError`（包括被包装在 source 链中的）
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlStateExceptionTranslator;

impl SqlStateExceptionTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl PersistenceExceptionTranslator for SqlStateExceptionTranslator {
    fn translate_exception_if_possible(
        &self,
        err: Throwable,
    ) -> Result<DataAccessError, Throwable> {
        let Some((category, message)) = find_sql_error(err.as_ref())
            .and_then(|sql| classify(sql).map(|category| (category, sql.to_string())))
        else {
            return Err(err);
        };

        let cause = err;
        Ok(match category {
            SqlStateCategory::BadSqlGrammar => DataAccessError::BadSqlGrammar { message, cause },
            SqlStateCategory::DuplicateKey => DataAccessError::DuplicateKey { message, cause },
            SqlStateCategory::DataIntegrityViolation => {
                DataAccessError::DataIntegrityViolation { message, cause }
            }
            SqlStateCategory::DataAccessResourceFailure => {
                DataAccessError::DataAccessResourceFailure { message, cause }
            }
            SqlStateCategory::TransientDataAccessResource => {
                DataAccessError::TransientDataAccessResource { message, cause }
            }
            SqlStateCategory::ConcurrencyFailure => {
                DataAccessError::ConcurrencyFailure { message, cause }
            }
        })
    }
}
