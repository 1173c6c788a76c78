use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::pixelcolor::{BinaryColor, Rgb888};
use embedded_graphics::prelude::*;
use tinybmp::Bmp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IconKind {
    Cpu,
    Ram,
    Disk,
    Network,
    Download,
    Upload,
    Ok,
    UnderVoltage,
    ThrottledHeat,
    ThrottledVoltage,
    Logo,
}

impl IconKind {
    pub const ALL: [IconKind; 11] = [
        IconKind::Cpu,
        IconKind::Ram,
        IconKind::Disk,
        IconKind::Network,
        IconKind::Download,
        IconKind::Upload,
        IconKind::Ok,
        IconKind::UnderVoltage,
        IconKind::ThrottledHeat,
        IconKind::ThrottledVoltage,
        IconKind::Logo,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            IconKind::Cpu => "cpu.bmp",
            IconKind::Ram => "ram.bmp",
            IconKind::Disk => "disk.bmp",
            IconKind::Network => "network.bmp",
            IconKind::Download => "download.bmp",
            IconKind::Upload => "upload.bmp",
            IconKind::Ok => "ok.bmp",
            IconKind::UnderVoltage => "under_voltage.bmp",
            IconKind::ThrottledHeat => "throttled_heat.bmp",
            IconKind::ThrottledVoltage => "throttled_voltage.bmp",
            IconKind::Logo => "logo.bmp",
        }
    }

    fn index(self) -> usize {
        IconKind::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or_default()
    }
}

/// A 1-bpp bitmap, rows packed MSB first as `ImageRaw<BinaryColor>` expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Icon {
    size: Size,
    data: Vec<u8>,
}

impl Icon {
    /// Threshold an RGB bitmap to on/off by luma.
    pub fn from_bmp_bytes(bytes: &[u8]) -> Result<Self> {
        let bmp = Bmp::<Rgb888>::from_slice(bytes).map_err(|e| eyre!("invalid bitmap: {e:?}"))?;
        let size = bmp.size();
        let stride = size.width.div_ceil(8) as usize;
        let mut data = vec![0u8; stride * size.height as usize];
        for Pixel(point, color) in bmp.pixels() {
            let luma = color.r() as u32 + color.g() as u32 + color.b() as u32;
            if luma > 3 * 127 {
                let (x, y) = (point.x as usize, point.y as usize);
                data[y * stride + x / 8] |= 0x80 >> (x % 8);
            }
        }
        Ok(Icon { size, data })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn draw<D>(&self, target: &mut D, top_left: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let raw = ImageRaw::<BinaryColor>::new(&self.data, self.size.width);
        Image::new(&raw, top_left).draw(target)
    }
}

/// Every icon the pages use, read once at startup.
#[derive(Clone, Debug)]
pub struct IconSet {
    icons: Vec<Icon>,
}

impl IconSet {
    /// Load all icons from `dir`. Any missing or unreadable file is fatal.
    pub fn load(dir: &Path) -> Result<Self> {
        let icons = IconKind::ALL
            .iter()
            .map(|kind| {
                let path = dir.join(kind.file_name());
                let bytes = std::fs::read(&path)
                    .wrap_err_with(|| format!("icon {} missing", path.display()))?;
                Icon::from_bmp_bytes(&bytes).wrap_err_with(|| format!("icon {} unreadable", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(dir = %dir.display(), count = icons.len(), "icons loaded");
        Ok(IconSet { icons })
    }

    pub fn get(&self, kind: IconKind) -> &Icon {
        &self.icons[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn asset_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/icons")
    }

    #[test]
    fn bundled_icons_load() {
        let icons = IconSet::load(&asset_dir()).unwrap();
        assert_eq!(icons.get(IconKind::Cpu).size(), Size::new(16, 16));
        assert_eq!(icons.get(IconKind::Download).size(), Size::new(8, 8));
        assert!(icons.get(IconKind::Logo).size().width <= 128);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let err = IconSet::load(Path::new("/nonexistent/oledmon/icons")).unwrap_err();
        assert!(format!("{err:?}").contains("cpu.bmp"));
    }

    #[test]
    fn garbage_bitmap_is_rejected() {
        assert!(Icon::from_bmp_bytes(b"not a bitmap").is_err());
    }
}
