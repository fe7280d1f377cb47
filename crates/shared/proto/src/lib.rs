//! gRPC protocol buffer definitions.
//!
//! This crate contains the generated gRPC client for:
//! - DirectoryLogic: the directory's domain operations driven by inbound events

/// Directory domain service definitions.
pub mod directory {
    tonic::include_proto!("directory");
}

// Re-export commonly used items
pub use directory::directory_logic_client::DirectoryLogicClient;
