//! Output helpers for binaries.

/// Create a directory and all of its parents if it does not already exist.
///
/// Evaluates to `NmrResult<()>`.
#[macro_export]
macro_rules! mkdir {
    ( $dir:expr ) => {
        {
            let dir: &std::path::Path = $dir.as_ref();
            if dir.is_dir() {
                Ok(())
            } else {
                std::fs::create_dir_all(dir)
                    .map_err($crate::error::NmrError::from)
            }
        }
    }
}

/// Write a set of named arrays to a `.npz` archive.
///
/// ```ignore
/// write_npz!(
///     outdir.join("spectrum.npz"),
///     arrays: {
///         "x" => &x,
///         "y" => &y,
///     }
/// )?;
/// ```
///
/// Evaluates to `NmrResult<()>`.
#[macro_export]
macro_rules! write_npz {
    (
        $filepath:expr,
        arrays: { $( $key:expr => $arr:expr ),* $(,)? }
    ) => {
        (|| -> $crate::error::NmrResult<()> {
            let mut output
                = ndarray_npy::NpzWriter::new(std::fs::File::create($filepath)?);
            $(
                output.add_array($key, $arr)?;
            )*
            output.finish()?;
            Ok(())
        })()
    }
}

#[cfg(test)]
mod test {
    use ndarray as nd;
    use ndarray_npy::NpzReader;
    use crate::error::NmrResult;

    #[test]
    fn npz_roundtrip() -> NmrResult<()> {
        let dir = std::env::temp_dir()
            .join(format!("nmr-sim-npz-{}", std::process::id()));
        crate::mkdir!(&dir)?;
        crate::mkdir!(&dir)?;
        let x: nd::Array1<f64> = nd::array![1.0, 2.0, 3.0];
        let y: nd::Array1<f64> = nd::array![0.5, 0.25, 0.125];
        let path = dir.join("out.npz");
        crate::write_npz!(&path, arrays: { "x" => &x, "y" => &y })?;
        let mut npz = NpzReader::new(std::fs::File::open(&path)?)?;
        assert_eq!(npz.len(), 2);
        let y_read: nd::Array1<f64> = npz.by_index(1)?;
        assert_eq!(y_read, y);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
