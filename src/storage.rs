//! Data directory, output files and the execution log

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, SecondsFormat};

/// Name of the default output file inside the data directory
pub const PRIMES_FILE: &str = "primes.txt";

const EXECUTION_LOG_FILE: &str = "execution_log.txt";

const DATA_DIR_NAME: &str = "segsieve";

/// `$XDG_DATA_HOME/segsieve`, falling back to `$HOME/.local/share/segsieve`
pub fn get_data_dir() -> io::Result<PathBuf> {
    data_dir_from(env::var_os("XDG_DATA_HOME"), env::var_os("HOME")).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "neither XDG_DATA_HOME nor HOME is set",
        )
    })
}

/// Empty variables count as unset
fn data_dir_from(xdg_data_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    let base = match xdg_data_home.filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let home = home.filter(|dir| !dir.is_empty())?;
            PathBuf::from(home).join(".local").join("share")
        }
    };
    Some(base.join(DATA_DIR_NAME))
}

/// Default output path, creating the data directory if needed
pub fn default_output_path() -> io::Result<PathBuf> {
    let data_dir = get_data_dir()?;
    fs::create_dir_all(&data_dir)?;
    Ok(data_dir.join(PRIMES_FILE))
}

/// Create `path` as an empty file, truncating any existing contents
pub fn create_data_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(())
}

/// Read back a primes file, one number per line. Any line that is not a decimal
/// number is an `InvalidData` error.
pub fn load_primes(path: &Path) -> io::Result<Vec<usize>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .enumerate()
        .map(|(line_no, line)| {
            line.parse::<usize>().map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: {:?}: {}", line_no + 1, line, e),
                )
            })
        })
        .collect()
}

/// One finished `primes` run, as recorded in the execution log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub lower_lim: usize,
    pub upper_lim: usize,
    pub num_threads: usize,
    pub segment_len: usize,
    pub prime_count: u64,
    pub elapsed: Duration,
}

impl fmt::Display for ExecutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] threads={} segment_len={} primes={} elapsed_us={}",
            self.lower_lim,
            self.upper_lim,
            self.num_threads,
            self.segment_len,
            self.prime_count,
            self.elapsed.as_micros()
        )
    }
}

/// Append `record` to the execution log in the data directory
pub fn log_execution(record: &ExecutionRecord) -> io::Result<()> {
    append_execution_record(&get_data_dir()?, record)
}

pub fn append_execution_record(data_dir: &Path, record: &ExecutionRecord) -> io::Result<()> {
    fs::create_dir_all(data_dir)?;
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(EXECUTION_LOG_FILE))?;

    let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Millis, false);
    writeln!(log, "{} {}", timestamp, record)
}
