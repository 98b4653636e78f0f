//! Kernel meta-file (furnsh list) writer and resolver

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::Config;
use crate::kernel::pool::KernelPool;
use crate::{Result, SpiceToolsError};

/// Symbol that expands to the configured kernel directory
pub const KERNELS_SYMBOL: &str = "KERNELS";

/// Builder for a meta-kernel listing the kernels to load
#[derive(Debug, Clone)]
pub struct MetaKernel {
    symbols: Vec<(String, String)>,
    kernels: Vec<String>,
}

impl MetaKernel {
    /// Start a meta-kernel whose `$KERNELS` symbol points at `kernel_dir`
    pub fn new<P: AsRef<Path>>(kernel_dir: P) -> Self {
        Self {
            symbols: vec![(
                KERNELS_SYMBOL.to_string(),
                kernel_dir.as_ref().display().to_string(),
            )],
            kernels: Vec::new(),
        }
    }

    /// Add a kernel path, which may start with a `$SYMBOL`
    pub fn kernel(mut self, path: impl Into<String>) -> Self {
        self.kernels.push(path.into());
        self
    }

    pub fn kernels<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kernels.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add or replace a path symbol
    pub fn path_symbol(mut self, symbol: impl Into<String>, value: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let value = value.into();
        match self.symbols.iter_mut().find(|(s, _)| *s == symbol) {
            Some(entry) => entry.1 = value,
            None => self.symbols.push((symbol, value)),
        }
        self
    }

    /// Render the meta-kernel text
    pub fn render(&self) -> Result<String> {
        if self.kernels.is_empty() {
            return Err(SpiceToolsError::InvalidParameter(
                "A meta-kernel needs at least one kernel".to_string(),
            ));
        }

        let list_indent = " ".repeat(24);
        let values = quote_list(self.symbols.iter().map(|(_, v)| v), &list_indent);
        let symbols = quote_list(self.symbols.iter().map(|(s, _)| s), &list_indent);
        let kernels = quote_list(self.kernels.iter(), "    ");

        Ok(format!(
            r"
\begintext

    This meta file contains the paths to needed SPICE kernels.

\begindata
      PATH_VALUES     = ( {values} )

      PATH_SYMBOLS    = ( {symbols} )

KERNELS_TO_LOAD = (
    {kernels}
)

\begintext
"
        ))
    }

    /// Write the meta-kernel to `output`
    pub fn write<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        let contents = self.render()?;
        fs::write(output.as_ref(), contents)?;
        info!(
            "Wrote meta-kernel with {} kernels to {}",
            self.kernels.len(),
            output.as_ref().display()
        );
        Ok(())
    }
}

/// Quote each item for a text kernel and join them one per line
fn quote_list<'a>(items: impl Iterator<Item = &'a String>, indent: &str) -> String {
    items
        .map(|item| format!("'{}'", item.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(&format!(",\n{}", indent))
}

/// Create a kernel meta-file from a list of kernel paths
///
/// Paths may use `$KERNELS`, which expands to the configured kernel
/// directory, e.g. `"$KERNELS/lsk/naif0012.tls"`.
pub fn make_meta<I, S, P>(kernels: I, output: P) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    P: AsRef<Path>,
{
    let config = Config::load()?;
    MetaKernel::new(&config.kernel_dir)
        .kernels(kernels)
        .write(output)
}

/// Resolve `KERNELS_TO_LOAD` against `PATH_SYMBOLS`/`PATH_VALUES`
pub fn resolve_kernels_to_load(pool: &KernelPool) -> Result<Vec<PathBuf>> {
    let kernels = pool.get_strings("KERNELS_TO_LOAD")?;

    let symbols = if pool.contains("PATH_SYMBOLS") {
        pool.get_strings("PATH_SYMBOLS")?
    } else {
        Vec::new()
    };
    let values = if pool.contains("PATH_VALUES") {
        pool.get_strings("PATH_VALUES")?
    } else {
        Vec::new()
    };
    if symbols.len() != values.len() {
        return Err(SpiceToolsError::KernelPool(format!(
            "PATH_SYMBOLS has {} entries but PATH_VALUES has {}",
            symbols.len(),
            values.len()
        )));
    }

    kernels
        .iter()
        .map(|kernel| {
            let Some(rest) = kernel.strip_prefix('$') else {
                return Ok(PathBuf::from(kernel));
            };
            let (symbol, tail) = rest.split_at(rest.find(['/', '\\']).unwrap_or(rest.len()));
            let index = symbols
                .iter()
                .position(|s| s.eq_ignore_ascii_case(symbol))
                .ok_or_else(|| {
                    SpiceToolsError::KernelPool(format!(
                        "Unknown path symbol ${} in {}",
                        symbol, kernel
                    ))
                })?;
            Ok(PathBuf::from(format!("{}{}", values[index], tail)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_meta_contents() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("test_meta.txt");

        MetaKernel::new("/kernels")
            .kernel("kernel1.bsp")
            .write(&output)
            .unwrap();
        let contents = fs::read_to_string(&output).unwrap();
        assert!(contents.contains("kernel1.bsp"));
        assert!(contents.contains("KERNELS"));
        assert!(contents.contains("PATH_VALUES"));
        assert!(contents.contains("PATH_SYMBOLS"));

        let output = dir.path().join("test_meta_multiple.txt");
        MetaKernel::new("/kernels")
            .kernels(["kernel1.bsp", "kernel2.bsp"])
            .write(&output)
            .unwrap();
        let contents = fs::read_to_string(&output).unwrap();
        assert!(contents.contains("'kernel1.bsp',\n    'kernel2.bsp'"));
    }

    #[test]
    fn test_empty_meta_rejected() {
        assert!(matches!(
            MetaKernel::new("/kernels").render(),
            Err(SpiceToolsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rendered_meta_round_trips_through_pool() {
        let text = MetaKernel::new("/data/kernels")
            .path_symbol("EXTRA", "/opt/more")
            .kernels([
                "$KERNELS/lsk/naif0012.tls",
                "$EXTRA/it's.bsp",
                "relative/de440s.bsp",
            ])
            .render()
            .unwrap();

        let mut pool = KernelPool::new();
        pool.load_str(&text).unwrap();
        let resolved = resolve_kernels_to_load(&pool).unwrap();
        assert_eq!(
            resolved,
            vec![
                PathBuf::from("/data/kernels/lsk/naif0012.tls"),
                PathBuf::from("/opt/more/it's.bsp"),
                PathBuf::from("relative/de440s.bsp"),
            ]
        );
    }

    #[test]
    fn test_unknown_symbol() {
        let mut pool = KernelPool::new();
        pool.load_str(
            "\\begindata\nPATH_SYMBOLS = ( 'A' )\nPATH_VALUES = ( '/a' )\nKERNELS_TO_LOAD = ( '$B/x.bsp' )\n",
        )
        .unwrap();
        assert!(resolve_kernels_to_load(&pool).is_err());
    }
}
