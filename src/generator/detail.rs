//! Render state of a post detail page

use crate::client::ClientError;
use crate::content::PostDetail;

/// A detail page is `Loading` while its document is being fetched
///
/// `Ready` and `NotFound` are terminal and come from a `Resolved` outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Ready(Box<PostDetail>),
    NotFound,
}

/// Terminal outcome of a detail fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Ready(Box<PostDetail>),
    NotFound,
}

impl Resolved {
    /// Classify the result of a detail fetch
    ///
    /// A missing document becomes `NotFound`; any other failure is returned
    /// to the caller and leaves nothing rendered.
    pub fn from_fetch(fetched: Result<PostDetail, ClientError>) -> Result<Self, ClientError> {
        match fetched {
            Ok(detail) => Ok(Resolved::Ready(Box::new(detail))),
            Err(e) if e.is_not_found() => Ok(Resolved::NotFound),
            Err(e) => Err(e),
        }
    }
}

impl From<Resolved> for DetailState {
    fn from(resolved: Resolved) -> Self {
        match resolved {
            Resolved::Ready(detail) => DetailState::Ready(detail),
            Resolved::NotFound => DetailState::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::detail_doc;

    fn detail() -> PostDetail {
        PostDetail::try_from(&detail_doc("a")).unwrap()
    }

    #[test]
    fn test_fetched_document_is_ready() {
        let resolved = Resolved::from_fetch(Ok(detail())).unwrap();
        assert_eq!(resolved, Resolved::Ready(Box::new(detail())));
        assert_eq!(
            DetailState::from(resolved),
            DetailState::Ready(Box::new(detail()))
        );
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let err = ClientError::NotFound {
            doc_type: "posts".to_string(),
            id: "zzz".to_string(),
        };
        let resolved = Resolved::from_fetch(Err(err)).unwrap();
        assert_eq!(resolved, Resolved::NotFound);
        assert_eq!(DetailState::from(resolved), DetailState::NotFound);
    }

    #[test]
    fn test_other_errors_propagate() {
        let err = ClientError::MissingMasterRef;
        assert!(Resolved::from_fetch(Err(err)).is_err());
    }
}
