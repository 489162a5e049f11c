use std::io::{BufWriter, Write};
use std::path::Path;

use crate::cloud::ScanCloud;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to write PLY file
    #[error("Failed to write PLY file")]
    Io(#[from] std::io::Error),
}

/// Write a scan cloud as a binary little-endian PLY file.
///
/// The file groups the attributes into co-indexed elements: `points`
/// (x, y, z), `color` (r, g, b), `std` (dx, dy, dz), `temperature` (t, only
/// when captured) and `modulation` (m), all float32, one record per
/// mask-true point. Any existing file at the path is overwritten.
///
/// # Arguments
///
/// * `cloud` - The assembled scan.
/// * `path` - The destination file path.
pub fn write_ply(cloud: &ScanCloud, path: impl AsRef<Path>) -> Result<(), PlyError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);

    let count = cloud.valid_len();

    writer.write_all(b"ply\n")?;
    writer.write_all(b"format binary_little_endian 1.0\n")?;
    write_element(&mut writer, "points", count, &["x", "y", "z"])?;
    write_element(&mut writer, "color", count, &["r", "g", "b"])?;
    write_element(&mut writer, "std", count, &["dx", "dy", "dz"])?;
    if cloud.temperature().is_some() {
        write_element(&mut writer, "temperature", count, &["t"])?;
    }
    write_element(&mut writer, "modulation", count, &["m"])?;
    writer.write_all(b"end_header\n")?;

    let valid: Vec<usize> = cloud
        .mask()
        .as_slice()
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.then_some(i))
        .collect();

    for &i in &valid {
        for v in cloud.points()[i] {
            writer.write_all(&(v as f32).to_le_bytes())?;
        }
    }
    for &i in &valid {
        for v in cloud.colors()[i] {
            writer.write_all(&v.to_le_bytes())?;
        }
    }
    for &i in &valid {
        for v in cloud.std()[i] {
            writer.write_all(&(v as f32).to_le_bytes())?;
        }
    }
    if let Some(temperature) = cloud.temperature() {
        for &i in &valid {
            writer.write_all(&(temperature[i] as f32).to_le_bytes())?;
        }
    }
    for &i in &valid {
        writer.write_all(&(cloud.modulation()[i] as f32).to_le_bytes())?;
    }

    writer.flush()?;
    Ok(())
}

fn write_element<W: Write>(
    writer: &mut W,
    name: &str,
    count: usize,
    properties: &[&str],
) -> Result<(), PlyError> {
    writeln!(writer, "element {name} {count}")?;
    for property in properties {
        writeln!(writer, "property float {property}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::assemble;
    use fringe_grid::{Field2, GridSize};

    fn sample_cloud(with_temperature: bool) -> ScanCloud {
        let size = GridSize {
            width: 3,
            height: 2,
        };
        let coords = Field2::new(size, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let color = Field2::from_size_val(size, [128.0f32, 64.0, 32.0]);
        let variance = Field2::from_size_val(size, 4.0);
        let modulation = Field2::new(size, vec![0.9, 0.1, 0.8, 0.7, 0.05, 0.6]).unwrap();
        let mask = Field2::new(size, vec![true, false, true, true, false, true]).unwrap();
        let temperature = Field2::from_size_val(size, 21.5);

        assemble(
            &coords,
            &coords,
            &coords,
            &color,
            &variance,
            &variance,
            &variance,
            &modulation,
            with_temperature.then_some(&temperature),
            &mask,
        )
        .unwrap()
    }

    fn split_header(bytes: &[u8]) -> (String, &[u8]) {
        let marker = b"end_header\n";
        let pos = bytes
            .windows(marker.len())
            .position(|w| w == marker)
            .unwrap();
        let header = String::from_utf8(bytes[..pos + marker.len()].to_vec()).unwrap();
        (header, &bytes[pos + marker.len()..])
    }

    #[test]
    fn test_write_ply_record_layout() -> Result<(), PlyError> {
        let cloud = sample_cloud(false);
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("scan.ply");
        write_ply(&cloud, &path)?;

        let bytes = std::fs::read(&path)?;
        let (header, payload) = split_header(&bytes);

        assert!(header.contains("element points 4"));
        assert!(header.contains("element color 4"));
        assert!(header.contains("element std 4"));
        assert!(header.contains("element modulation 4"));
        assert!(!header.contains("element temperature"));

        // 4 records of (3 + 3 + 3 + 1) float32
        assert_eq!(payload.len(), 4 * 10 * 4);

        // first point record is the first mask-true pixel
        let x = f32::from_le_bytes(payload[0..4].try_into().unwrap());
        assert_eq!(x, 1.0);
        Ok(())
    }

    #[test]
    fn test_write_ply_with_temperature() -> Result<(), PlyError> {
        let cloud = sample_cloud(true);
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("scan.ply");
        write_ply(&cloud, &path)?;

        let bytes = std::fs::read(&path)?;
        let (header, payload) = split_header(&bytes);

        assert!(header.contains("element temperature 4"));
        assert_eq!(payload.len(), 4 * 11 * 4);

        // temperature block sits between std and modulation
        let offset = 4 * 9 * 4;
        let t = f32::from_le_bytes(payload[offset..offset + 4].try_into().unwrap());
        assert_eq!(t, 21.5);
        Ok(())
    }

    #[test]
    fn test_write_ply_overwrites() -> Result<(), PlyError> {
        let cloud = sample_cloud(false);
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("scan.ply");

        std::fs::write(&path, b"stale contents")?;
        write_ply(&cloud, &path)?;

        let bytes = std::fs::read(&path)?;
        assert!(bytes.starts_with(b"ply\n"));
        Ok(())
    }
}
