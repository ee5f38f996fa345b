use std::{fs, path::PathBuf};

/// Scratch file that is removed when the test finishes
pub struct TestFile {
    path: PathBuf,
}

impl TestFile {
    /// Create a new scratch path with a name based on the test name
    pub fn new(test_name: &str) -> Self {
        let path = std::env::temp_dir()
            .join(format!("bloomfile_test_{}_{}.bf", test_name, std::process::id()));
        Self { path }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> PathBuf {
        self.path.clone()
    }

    /// Write raw bytes, bypassing the filter encoder
    #[allow(dead_code)]
    pub fn write(&self, bytes: &[u8]) {
        fs::write(&self.path, bytes).expect("Failed to write test file");
    }
}

impl Drop for TestFile {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// `.bf` image assembled by hand
#[allow(dead_code)]
pub fn bf_image(m: i32, k: i32, n: i32, error_rate: f64, bits: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&m.to_le_bytes());
    data.extend_from_slice(&k.to_le_bytes());
    data.extend_from_slice(&n.to_le_bytes());
    data.extend_from_slice(&error_rate.to_le_bytes());
    data.extend_from_slice(bits);
    data
}
