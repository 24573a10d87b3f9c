use thiserror::Error;

/// Failures surfaced by kernel loading and ephemeris queries.
///
/// Every query path returns one of these variants; nothing degrades into
/// silent zero or `NaN` states.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Invalid DAF/SPK format: {0}")]
    Format(String),

    #[error("Unable to resolve name or id: {0}")]
    NameResolution(String),

    #[error("No coverage for body {body} (segment center {center}) at ET {epoch}")]
    Coverage { body: i32, center: i32, epoch: f64 },

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("No common ancestor between body {target} and body {observer} in loaded kernels at ET {epoch}")]
    Chain {
        target: i32,
        observer: i32,
        epoch: f64,
    },

    #[error("Unknown DAF handle: {0}")]
    UnknownHandle(u32),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for KernelError {
    fn from(err: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => KernelError::Format("truncated binary record".into()),
            nom::Err::Error(e) | nom::Err::Failure(e) => KernelError::Format(format!(
                "binary decoding failed ({:?}) with {} bytes left",
                e.code,
                e.input.len()
            )),
        }
    }
}

impl PartialEq for KernelError {
    fn eq(&self, other: &Self) -> bool {
        use KernelError::*;
        match (self, other) {
            (Format(a), Format(b)) => a == b,
            (NameResolution(a), NameResolution(b)) => a == b,
            (
                Coverage {
                    body: b1,
                    center: c1,
                    epoch: e1,
                },
                Coverage {
                    body: b2,
                    center: c2,
                    epoch: e2,
                },
            ) => b1 == b2 && c1 == c2 && e1 == e2,
            (Frame(a), Frame(b)) => a == b,
            (
                Chain {
                    target: t1,
                    observer: o1,
                    epoch: e1,
                },
                Chain {
                    target: t2,
                    observer: o2,
                    epoch: e2,
                },
            ) => t1 == t2 && o1 == o2 && e1 == e2,
            (UnknownHandle(a), UnknownHandle(b)) => a == b,

            // io errors are not comparable: same variant means equal
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
