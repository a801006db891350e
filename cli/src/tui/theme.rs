use ratatui::style::Color;

pub const COLOR_BG: Color = Color::Black;
pub const COLOR_PRIMARY: Color = Color::Rgb(100, 149, 237); // Cornflower blue
pub const COLOR_SUCCESS: Color = Color::Rgb(72, 199, 142); // Soft green
pub const COLOR_WARNING: Color = Color::Rgb(230, 179, 92); // Soft amber
pub const COLOR_ERROR: Color = Color::Rgb(224, 108, 117); // Soft red
pub const COLOR_DISABLED: Color = Color::Rgb(110, 110, 120);
pub const COLOR_BORDER: Color = Color::Rgb(80, 80, 90); // Subtle gray
pub const COLOR_TEXT: Color = Color::Rgb(200, 200, 210); // Soft white
