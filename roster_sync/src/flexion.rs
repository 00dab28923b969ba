// Grammatical gender agreement of role titles.

use regex::Regex;

use std::fmt::Display;

/// Gender recorded for a member. Role titles are written in the masculine form
/// unless the member is recorded as feminine.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum Gender {
    #[default]
    Unspecified,
    Feminine,
    Masculine,
}

impl Gender {
    /// Reads the value stored in the gender column. Unknown values count as unspecified.
    pub fn parse(s: &str) -> Gender {
        match s.trim().to_lowercase().as_str() {
            "feminino" | "feminina" | "f" => Gender::Feminine,
            "masculino" | "m" => Gender::Masculine,
            _ => Gender::Unspecified,
        }
    }

    /// The value written to the gender column.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Unspecified => "",
            Gender::Feminine => "Feminino",
            Gender::Masculine => "Masculino",
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One substitution of the rule table.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(pattern: &str, replacement: &'static str) -> Rule {
        Rule {
            pattern: Regex::new(pattern).expect("static pattern"),
            replacement,
        }
    }

    fn apply(&self, s: &str) -> String {
        self.pattern.replace_all(s, self.replacement).into_owned()
    }

    fn matches(&self, s: &str) -> bool {
        self.pattern.is_match(s)
    }
}

/// Role formatting rules. The rules are applied in this order:
///
/// 1. plural titles are brought to the singular, whatever the gender;
/// 2. for feminine members, the simple nouns are flexed word by word;
/// 3. for feminine members, a secretarial title is flexed and then its
///    qualifying adjective, so that both agree.
#[derive(Debug, Clone)]
pub struct RoleFormatter {
    singular: Vec<Rule>,
    feminine: Vec<Rule>,
    secretary: Rule,
    secretary_qualifiers: Vec<Rule>,
}

impl Default for RoleFormatter {
    fn default() -> Self {
        RoleFormatter::new()
    }
}

impl RoleFormatter {
    pub fn new() -> RoleFormatter {
        RoleFormatter {
            singular: vec![
                Rule::new(r"(?i)Secretários-Gerais Executivos", "Secretário-Geral Executivo"),
                Rule::new(r"(?i)Vice-Presidentes", "Vice-Presidente"),
            ],
            feminine: vec![
                Rule::new(r"\bMembro\b", "Membra"),
                Rule::new(r"\bCoordenador\b", "Coordenadora"),
                Rule::new(r"\bProcurador\b", "Procuradora"),
                Rule::new(r"\bDiretor\b", "Diretora"),
                Rule::new(r"\bConselheiro\b", "Conselheira"),
            ],
            secretary: Rule::new(r"\bSecretário\b", "Secretária"),
            secretary_qualifiers: vec![Rule::new(r"\bExecutivo\b", "Executiva")],
        }
    }

    /// Brings the known plural titles to their singular form.
    pub fn singular(&self, role: &str) -> String {
        self.singular
            .iter()
            .fold(role.to_string(), |acc, rule| rule.apply(&acc))
    }

    /// The role title adjusted to the gender of the member.
    ///
    /// ```
    /// use roster_sync::flexion::{Gender, RoleFormatter};
    ///
    /// let f = RoleFormatter::new();
    /// assert_eq!(f.flex("Secretário Executivo", Gender::Feminine), "Secretária Executiva");
    /// assert_eq!(f.flex("Vice-Presidentes", Gender::Unspecified), "Vice-Presidente");
    /// ```
    pub fn flex(&self, role: &str, gender: Gender) -> String {
        let role = self.singular(role);
        if gender != Gender::Feminine {
            return role;
        }
        let mut role = self
            .feminine
            .iter()
            .fold(role, |acc, rule| rule.apply(&acc));
        if self.secretary.matches(&role) {
            role = self.secretary.apply(&role);
            role = self
                .secretary_qualifiers
                .iter()
                .fold(role, |acc, rule| rule.apply(&acc));
        }
        role
    }

    /// Flexes every role of a member and joins them into one phrase.
    pub fn format_roles(&self, roles: &[String], gender: Gender, conjunction: &str) -> String {
        let flexed: Vec<String> = roles.iter().map(|r| self.flex(r, gender)).collect();
        join_roles(&flexed, conjunction)
    }
}

/// Natural-language list: `A`, `A and B`, `A, B and C`.
///
/// ```
/// use roster_sync::flexion::join_roles;
///
/// let items: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
/// assert_eq!(join_roles(&items, "and"), "A, B and C");
/// ```
pub fn join_roles(items: &[String], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [single] => single.clone(),
        [init @ .., last] => format!("{} {} {}", init.join(", "), conjunction, last),
    }
}
