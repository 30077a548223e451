//! Query predicates and options in the CMS query syntax

/// A single query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match on a document path, e.g. `document.type`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: &str, value: &str) -> Self {
        Predicate::At {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    /// `[at(document.type,"posts")]`
    pub fn render(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                format!(r#"[at({},"{}")]"#, path, value.replace('"', "\\\""))
            }
        }
    }
}

/// Render a conjunction of predicates as the `q` parameter
pub fn render_query(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(Predicate::render).collect();
    format!("[{}]", inner)
}

/// Sort key for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }
}

/// Render orderings as the `orderings` parameter
pub fn render_orderings(orderings: &[Ordering]) -> String {
    let fields: Vec<String> = orderings
        .iter()
        .map(|o| {
            if o.descending {
                format!("{} desc", o.field)
            } else {
                o.field.clone()
            }
        })
        .collect();
    format!("[{}]", fields.join(","))
}

/// Options threaded into every query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Content ref; `None` selects the published (master) snapshot
    pub reference: Option<String>,
    pub page_size: Option<usize>,
    /// Restrict returned `data` fields, e.g. `posts.title`
    pub fetch: Vec<String>,
    pub orderings: Vec<Ordering>,
    /// Only return documents after this document id in the ordering
    pub after: Option<String>,
}

impl QueryOptions {
    /// Options carrying the given ref (preview token or `None`)
    pub fn with_ref(reference: Option<&str>) -> Self {
        Self {
            reference: reference.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn fetch(mut self, fields: &[&str]) -> Self {
        self.fetch = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn after(mut self, id: &str) -> Self {
        self.after = Some(id.to_string());
        self
    }
}
