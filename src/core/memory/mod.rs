/*!
Memory handling for sensitive data in the QSP protocol.
*/

pub mod key_material;

pub use key_material::{SessionKeys, SecretBytes};
