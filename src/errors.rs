pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // All of the tool's I/O goes through the image crate, whose error type
    // wraps the underlying io::Error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    // Fatal: the solver produced an empty range where a non-empty one is
    // required. This indicates a bug, not bad input.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}
