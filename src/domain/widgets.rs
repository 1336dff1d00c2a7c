// Render-ready widget models consumed by the charting front end
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Brand,
    Green,
    Red,
    Amber,
    Purple,
    Cyan,
    Emerald,
    Rose,
    Silver,
    Bronze,
}

impl Accent {
    pub fn color(self) -> &'static str {
        match self {
            Accent::Brand => "#4f8aff",
            Accent::Green => "#22c55e",
            Accent::Red => "#ef4444",
            Accent::Amber => "#eab308",
            Accent::Purple => "#a855f7",
            Accent::Cyan => "#06b6d4",
            Accent::Emerald => "#34d399",
            Accent::Rose => "#f43f5e",
            Accent::Silver => "#aaaabb",
            Accent::Bronze => "#cd7f32",
        }
    }
}

impl Serialize for Accent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.color())
    }
}

/// Colours cycled over funnel stages.
pub const FUNNEL_PALETTE: [Accent; 7] = [
    Accent::Cyan,
    Accent::Brand,
    Accent::Purple,
    Accent::Amber,
    Accent::Green,
    Accent::Emerald,
    Accent::Rose,
];

pub fn palette_color(index: usize) -> Accent {
    FUNNEL_PALETTE[index % FUNNEL_PALETTE.len()]
}

#[derive(Debug, Clone, Serialize)]
pub struct TileData {
    pub id: String,
    pub label: String,
    pub value: String,
    pub accent: Accent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl TileData {
    pub fn new(id: &str, label: &str, value: String, accent: Accent) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            value,
            accent,
            subtitle: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(subtitle.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Area,
    Bar,
    HorizontalBar,
    Donut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesStyle {
    Area,
    Line,
    Bar,
    Slice,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub style: SeriesStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Accent>,
    pub values: Vec<f64>,
    /// Per-point colours, empty when the series has a single colour.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub point_colors: Vec<Accent>,
}

impl SeriesData {
    pub fn new(id: &str, name: &str, style: SeriesStyle, values: Vec<f64>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            style,
            color: None,
            values,
            point_colors: Vec::new(),
        }
    }

    pub fn colored(mut self, color: Accent) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_point_colors(mut self, colors: Vec<Accent>) -> Self {
        self.point_colors = colors;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub height: u32,
    pub currency: bool,
    pub categories: Vec<String>,
    pub series: Vec<SeriesData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

impl ChartData {
    pub fn new(id: &str, title: &str, kind: ChartKind, height: u32) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            height,
            currency: false,
            categories: Vec::new(),
            series: Vec::new(),
            empty_message: None,
        }
    }

    pub fn currency(mut self) -> Self {
        self.currency = true;
        self
    }

    pub fn with_data(mut self, categories: Vec<String>, series: Vec<SeriesData>) -> Self {
        self.categories = categories;
        self.series = series;
        self
    }

    pub fn empty(mut self, message: &str) -> Self {
        self.empty_message = Some(message.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub align: Align,
}

impl Column {
    pub const fn new(key: &'static str, label: &'static str, align: Align) -> Self {
        Self { key, label, align }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<Accent>,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            badge: None,
        }
    }

    pub fn badge(text: impl Into<String>, accent: Accent) -> Self {
        Self {
            text: text.into(),
            badge: Some(accent),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub id: String,
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

impl TableData {
    pub fn new(id: &str, title: &str, columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Self {
        // Tables render their own empty state
        let empty_message = rows.is_empty().then(|| "Sem dados".to_string());
        Self {
            id: id.to_string(),
            title: title.to_string(),
            columns,
            rows,
            empty_message,
        }
    }
}

/// Fixed-size team highlight card.
#[derive(Debug, Clone, Serialize)]
pub struct HighlightCard {
    pub medal: String,
    pub accent: Accent,
    pub owner: String,
    pub revenue: String,
    pub conversion: Cell,
    pub summary: String,
}
