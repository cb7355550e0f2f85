//! 持久化异常翻译器
//!
//! 翻译器接管错误的所有权：能识别时返回 `Ok(DataAccessError)`，
//! 不能识别时通过 `Err` 原样交还，调用方继续尝试下一个翻译器或直接传播。

use std::fmt;
use std::sync::Arc;

use weave_core::Throwable;

use crate::error::DataAccessError;

pub trait PersistenceExceptionTranslator: Send + Sync {
    fn translate_exception_if_possible(&self, err: Throwable) -> Result<DataAccessError, Throwable>;
}

impl<F> PersistenceExceptionTranslator for F
where
    F: Fn(Throwable) -> Result<DataAccessError, Throwable> + Send + Sync,
{
    fn translate_exception_if_possible(
        &self,
        err: Throwable,
    ) -> Result<DataAccessError, Throwable> {
        self(err)
    }
}

/// 依次尝试多个翻译器，第一个识别成功的生效
#[derive(Clone, Default)]
pub struct ChainedPersistenceExceptionTranslator {
    delegates: Vec<Arc<dyn PersistenceExceptionTranslator>>,
}

impl ChainedPersistenceExceptionTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_delegate(&mut self, delegate: Arc<dyn PersistenceExceptionTranslator>) -> &mut Self {
        self.delegates.push(delegate);
        self
    }

    pub fn delegates(&self) -> &[Arc<dyn PersistenceExceptionTranslator>] {
        &self.delegates
    }
}

impl FromIterator<Arc<dyn PersistenceExceptionTranslator>>
    for ChainedPersistenceExceptionTranslator
{
    fn from_iter<I: IntoIterator<Item = Arc<dyn PersistenceExceptionTranslator>>>(iter: I) -> Self {
        Self {
            delegates: iter.into_iter().collect(),
        }
    }
}

impl PersistenceExceptionTranslator for ChainedPersistenceExceptionTranslator {
    fn translate_exception_if_possible(
        &self,
        err: Throwable,
    ) -> Result<DataAccessError, Throwable> {
        let mut current = err;
        for delegate in &self.delegates {
            match delegate.translate_exception_if_possible(current) {
                Ok(translated) => return Ok(translated),
                Err(original) => current = original,
            }
        }
        Err(current)
    }
}

impl fmt::Debug for ChainedPersistenceExceptionTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedPersistenceExceptionTranslator")
            .field("delegates", &self.delegates.len())
            .finish()
    }
}

/// 尽力翻译
///
/// 已经是 `DataAccessError` 的错误原样返回；翻译器不识别时也原样返回。
pub fn translate_if_necessary(
    err: Throwable,
    translator: &dyn PersistenceExceptionTranslator,
) -> Throwable {
    if err.is::<DataAccessError>() {
        return err;
    }

    match translator.translate_exception_if_possible(err) {
        Ok(translated) => {
            tracing::debug!("Translated persistence error: {}", translated);
            Box::new(translated)
        }
        Err(original) => {
            tracing::trace!("No translator recognised error: {}", original);
            original
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct ConnectionReset;

    #[derive(Debug, thiserror::Error)]
    #[error("something else")]
    struct Unrelated;

    fn reset_translator(err: Throwable) -> Result<DataAccessError, Throwable> {
        if err.is::<ConnectionReset>() {
            return Ok(DataAccessError::DataAccessResourceFailure {
                message: err.to_string(),
                cause: err,
            });
        }
        Err(err)
    }

    #[test]
    fn test_chain_first_match_wins() {
        let never: Arc<dyn PersistenceExceptionTranslator> =
            Arc::new(|err: Throwable| -> Result<DataAccessError, Throwable> { Err(err) });
        let reset: Arc<dyn PersistenceExceptionTranslator> = Arc::new(reset_translator);
        let chain: ChainedPersistenceExceptionTranslator = [never, reset].into_iter().collect();

        let translated = chain
            .translate_exception_if_possible(Box::new(ConnectionReset))
            .unwrap();
        assert!(matches!(
            translated,
            DataAccessError::DataAccessResourceFailure { .. }
        ));
        assert!(translated
            .original_cause()
            .is_some_and(|c| c.is::<ConnectionReset>()));
    }

    #[test]
    fn test_miss_returns_original_unchanged() {
        let mut chain = ChainedPersistenceExceptionTranslator::new();
        chain.add_delegate(Arc::new(reset_translator));

        let err = translate_if_necessary(Box::new(Unrelated), &chain);
        assert!(err.is::<Unrelated>());
    }

    #[test]
    fn test_data_access_error_passes_through() {
        let chain = ChainedPersistenceExceptionTranslator::new();
        let err = translate_if_necessary(
            Box::new(DataAccessError::IncorrectResultSize {
                expected: 1,
                actual: 2,
            }),
            &chain,
        );
        assert!(matches!(
            err.downcast_ref::<DataAccessError>(),
            Some(DataAccessError::IncorrectResultSize { expected: 1, actual: 2 })
        ));
    }
}
