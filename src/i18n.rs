//! Interface translations for the three supported locales.
//!
//! The table is code-defined and loaded once behind a `Lazy`. An unknown
//! key comes back verbatim, so a missing entry degrades to something
//! readable instead of panicking.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Supported interface languages. Georgian is the default, matching the
/// original deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Ka,
    En,
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ka => "ka",
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ka" => Some(Self::Ka),
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Ka => Self::En,
            Self::En => Self::Es,
            Self::Es => Self::Ka,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Ka => 0,
            Self::En => 1,
            Self::Es => 2,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::Ka
    }
}

/// [ka, en, es] per key.
static STRINGS: Lazy<HashMap<&'static str, [&'static str; 3]>> = Lazy::new(|| {
    HashMap::from([
        ("app_name", ["კოდების ბიბლიოთეკა", "Code Library", "Biblioteca de código"]),
        ("nav_all", ["ყველა", "All", "Todo"]),
        ("nav_components", ["კომპონენტები", "Components", "Componentes"]),
        ("nav_websites", ["საიტები", "Websites", "Sitios web"]),
        ("nav_templates", ["შაბლონები", "Templates", "Plantillas"]),
        ("nav_favorites", ["რჩეულები", "Favorites", "Favoritos"]),
        ("search_placeholder", ["ძებნა...", "Search...", "Buscar..."]),
        ("filter_category", ["კატეგორია", "Category", "Categoría"]),
        ("filter_all", ["ყველა", "All", "Todas"]),
        ("tab_preview", ["გადახედვა", "Preview", "Vista previa"]),
        ("tab_code", ["კოდი", "Code", "Código"]),
        ("save", ["შენახვა", "Save", "Guardar"]),
        ("save_as", ["შენახვა ასლად", "Save as copy", "Guardar como copia"]),
        ("copy_suffix", ["ასლი", "copy", "copia"]),
        ("unsaved_changes", ["შენახვა გჭირდებათ", "Unsaved changes", "Cambios sin guardar"]),
        ("saved", ["შენახულია", "Saved", "Guardado"]),
        ("copied", ["დაკოპირდა", "Copied", "Copiado"]),
        ("delete", ["წაშლა", "Delete", "Eliminar"]),
        ("deleted", ["წაიშალა", "Deleted", "Eliminado"]),
        ("add_snippet", ["ახალი კოდი", "New snippet", "Nuevo fragmento"]),
        ("add_title", ["სათაური", "Title", "Título"]),
        ("add_description", ["აღწერა", "Description", "Descripción"]),
        ("add_category", ["კატეგორია", "Category", "Categoría"]),
        ("add_type", ["ტიპი", "Type", "Tipo"]),
        ("add_ai_prompt", ["AI მოთხოვნა", "AI prompt", "Petición de IA"]),
        ("add_image", ["სურათი", "Thumbnail", "Miniatura"]),
        ("add_generate", ["გენერაცია", "Generate", "Generar"]),
        ("add_generating", ["გენერირდება...", "Generating...", "Generando..."]),
        ("add_submit", ["დამატება", "Add", "Añadir"]),
        ("add_cancel", ["გაუქმება", "Cancel", "Cancelar"]),
        ("add_security", ["დაცვა", "Security check", "Comprobación de seguridad"]),
        ("add_password_placeholder", ["პაროლი", "Password", "Contraseña"]),
        ("add_password_error", ["პაროლი არასწორია", "Wrong password", "Contraseña incorrecta"]),
        ("validation_title", ["სათაური აუცილებელია", "Title is required", "El título es obligatorio"]),
        ("validation_category", ["კატეგორია აუცილებელია", "Category is required", "La categoría es obligatoria"]),
        ("validation_code", ["კოდი ცარიელია", "Code is empty", "El código está vacío"]),
        ("no_codes_title", ["კოდები ვერ მოიძებნა", "No snippets found", "No se encontraron fragmentos"]),
        ("no_codes_desc", ["დაამატეთ პირველი კოდი", "Add your first snippet", "Añade tu primer fragmento"]),
        ("loading", ["იტვირთება...", "Loading...", "Cargando..."]),
        ("saving", ["ინახება...", "Saving...", "Guardando..."]),
        ("save_as_title", ["ახალი სახელი", "New name", "Nuevo nombre"]),
        ("confirm_delete", ["წავშალოთ?", "Delete this snippet?", "¿Eliminar este fragmento?"]),
        ("error_prefix", ["შეცდომა", "Error", "Error"]),
        ("dismiss_hint", ["Esc - დახურვა", "Esc to dismiss", "Esc para cerrar"]),
    ])
});

/// Look up a translated string. Unknown keys come back unchanged.
pub fn tr(lang: Language, key: &'static str) -> &'static str {
    match STRINGS.get(key) {
        Some(entries) => entries[lang.index()],
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_per_language() {
        assert_eq!(tr(Language::En, "save"), "Save");
        assert_eq!(tr(Language::Ka, "save"), "შენახვა");
        assert_eq!(tr(Language::Es, "save"), "Guardar");
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(tr(Language::En, "no_such_key"), "no_such_key");
    }

    #[test]
    fn every_key_has_all_locales() {
        for (key, entries) in STRINGS.iter() {
            for value in entries {
                assert!(!value.is_empty(), "missing translation for {key}");
            }
        }
    }
}
