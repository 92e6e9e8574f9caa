use eframe::egui::Color32;

pub const UNAFFILIATED: &str = "Other";

pub const DEFAULT_COLOR: Color32 = Color32::from_rgb(120, 132, 150);

const FACULTY_COLORS: &[(&str, Color32)] = &[
    ("Arts et sciences", Color32::from_rgb(66, 135, 245)),
    ("Aménagement", Color32::from_rgb(242, 153, 74)),
    ("Droit", Color32::from_rgb(155, 89, 182)),
    ("Éducation", Color32::from_rgb(46, 204, 113)),
    ("Études supérieures", Color32::from_rgb(26, 188, 156)),
    ("Kinésiologie", Color32::from_rgb(231, 76, 60)),
    ("Médecine", Color32::from_rgb(52, 152, 219)),
    ("Médecine dentaire", Color32::from_rgb(93, 173, 226)),
    ("Médecine vétérinaire", Color32::from_rgb(22, 160, 133)),
    ("Musique", Color32::from_rgb(241, 196, 15)),
    ("Pharmacie", Color32::from_rgb(230, 126, 34)),
    ("Santé publique", Color32::from_rgb(39, 174, 96)),
    ("Sciences infirmières", Color32::from_rgb(236, 112, 160)),
    ("Théologie", Color32::from_rgb(149, 165, 166)),
    ("HEC Montréal", Color32::from_rgb(192, 57, 43)),
    ("Polytechnique", Color32::from_rgb(211, 84, 0)),
];

pub fn faculty_color(faculty: &str) -> Color32 {
    FACULTY_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(faculty.trim()))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR)
}
