use crate::domain::CategoricalField;

/// Legacy, mis-encoded, or merged spellings and their canonical replacement.
const SUBSTITUTIONS: &[(CategoricalField, &str, &str)] = &[
    (CategoricalField::Region, "Nari\u{fffd}o", "Nariño"),
    (
        CategoricalField::Region,
        "Archip.De San Andres, Providencia y Santa Catalina",
        "Archipielago de San Andrés, Providencia y Santa Catalina",
    ),
    // Accreditation variants collapse into the base ethnic group.
    (CategoricalField::Ethnicity, "Indigena (Acreditado RA)", "Indigena"),
    (
        CategoricalField::Ethnicity,
        "Negro(a) o Afrocolombiano(a)",
        "Afrocolombiano(a)",
    ),
    (
        CategoricalField::Ethnicity,
        "Negro (Acreditado RA)",
        "Afrocolombiano(a)",
    ),
    (
        CategoricalField::Ethnicity,
        "Afrocolombiano (Acreditado RA)",
        "Afrocolombiano(a)",
    ),
    (CategoricalField::Ethnicity, "Gitano(a) ROM", "Gitano(a)"),
    (
        CategoricalField::Ethnicity,
        "Gitano (RROM) (Acreditado RA)",
        "Gitano(a)",
    ),
    (
        CategoricalField::Ethnicity,
        "Palenquero (Acreditado RA)",
        "Palenquero",
    ),
    (CategoricalField::AgeBracket, "entre 29 y 60", "entre 29 y 59"),
    (CategoricalField::AgeBracket, "entre 61 y 100", "entre 60 y 110"),
    (
        CategoricalField::EventType,
        "Desaparici\u{fffd}n forzada",
        "Desaparición forzada",
    ),
    (
        CategoricalField::EventType,
        "DesapariciÃ³n forzada",
        "Desaparición forzada",
    ),
    (
        CategoricalField::EventType,
        "Vinculaci\u{fffd}n de Ni\u{fffd}os Ni\u{fffd}as y Adolescentes a Actividades Relacionadas con grupos armados",
        "Vinculación de Niños Niñas y Adolescentes a Actividades Relacionadas con grupos armados",
    ),
    (
        CategoricalField::EventType,
        "VinculaciÃ³n de NiÃ±os NiÃ±as y Adolescentes a Actividades Relacionadas con grupos armados",
        "Vinculación de Niños Niñas y Adolescentes a Actividades Relacionadas con grupos armados",
    ),
    (
        CategoricalField::EventType,
        "Minas Antipersonal, Munici\u{fffd}n sin Explotar y Artefacto Explosivo improvisado",
        "Minas Antipersonal, Munición sin Explotar y Artefacto Explosivo improvisado",
    ),
];

/// Placeholder values that make a record unusable.
const DISALLOWED: &[(CategoricalField, &str)] = &[
    (CategoricalField::Region, "SIN DEFINIR"),
    (CategoricalField::Sex, "No Informa"),
    (CategoricalField::Disability, "Por Establecer"),
    (CategoricalField::AgeBracket, "ND"),
    (CategoricalField::EventType, "Sin informacion"),
];

pub(crate) const SEX_VALUES: &[&str] = &["Mujer", "Hombre", "LGBTI", "Intersexual"];

pub(crate) const ETHNICITY_VALUES: &[&str] = &[
    "Ninguna",
    "Afrocolombiano(a)",
    "Indigena",
    "Raizal del Archipielago de San Andres y Providencia",
    "Gitano(a)",
    "Palenquero",
];

pub(crate) const DISABILITY_VALUES: &[&str] = &[
    "Ninguna",
    "Fisica",
    "Psicosocial (Mental)",
    "Multiple",
    "Auditiva",
    "Intelectual",
    "Visual",
];

pub(crate) const AGE_BRACKET_VALUES: &[&str] = &[
    "entre 0 y 5",
    "entre 6 y 11",
    "entre 12 y 17",
    "entre 18 y 28",
    "entre 29 y 59",
    "entre 60 y 110",
];

pub(crate) fn substitute(field: CategoricalField, value: &str) -> &str {
    SUBSTITUTIONS
        .iter()
        .find(|(candidate, from, _)| *candidate == field && *from == value)
        .map(|(_, _, to)| *to)
        .unwrap_or(value)
}

pub(crate) fn is_disallowed(field: CategoricalField, value: &str) -> bool {
    DISALLOWED
        .iter()
        .any(|(candidate, blocked)| *candidate == field && *blocked == value)
}
