fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile directory domain service proto (client only, the server lives in the directory)
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["proto/directory.proto"], &["proto/"])?;

    Ok(())
}
