use image::Rgb;

/// How a [`Bitmap`](crate::Bitmap) is turned into pixels.
///
/// Built per request and passed explicitly; the defaults are 10 px modules, a
/// 4-module quiet zone, black on white.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Pixels per module along each axis.
    pub module_size: u32,
    /// Quiet zone width in modules.
    pub border: u32,
    pub dark: Rgb<u8>,
    pub light: Rgb<u8>,
}

impl RenderConfig {
    pub const DEFAULT_MODULE_SIZE: u32 = 10;
    pub const DEFAULT_BORDER: u32 = 4;

    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.module_size = module_size;
        self
    }

    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    pub fn with_colors(mut self, dark: Rgb<u8>, light: Rgb<u8>) -> Self {
        self.dark = dark;
        self.light = light;
        self
    }

    /// Both colors are shades of gray, so a single-channel image suffices.
    pub fn is_grayscale(&self) -> bool {
        let gray = |c: &Rgb<u8>| c[0] == c[1] && c[1] == c[2];
        gray(&self.dark) && gray(&self.light)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            module_size: Self::DEFAULT_MODULE_SIZE,
            border: Self::DEFAULT_BORDER,
            dark: Rgb([0, 0, 0]),
            light: Rgb([255, 255, 255]),
        }
    }
}
