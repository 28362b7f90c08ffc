use std::sync::OnceLock;

use tera::{Context, Tera};

use crate::error::Result;

static TERA: OnceLock<Tera> = OnceLock::new();

const TEMPLATES: &[(&str, &str)] = &[
    ("centers.txt", include_str!("../templates/centers.txt")),
    ("classification.txt", include_str!("../templates/classification.txt")),
    ("submission.txt", include_str!("../templates/submission.txt")),
    ("verification.txt", include_str!("../templates/verification.txt")),
    ("history.txt", include_str!("../templates/history.txt")),
];

pub fn get_tera() -> Result<&'static Tera> {
    if let Some(tera) = TERA.get() {
        return Ok(tera);
    }
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.to_vec())?;
    Ok(TERA.get_or_init(|| tera))
}

pub fn render(name: &str, ctx: &Context) -> Result<String> {
    Ok(get_tera()?.render(name, ctx)?)
}
