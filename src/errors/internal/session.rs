use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Could not allocate a unique session token after {attempts} attempts")]
    TokenCollision { attempts: u32 },
}
