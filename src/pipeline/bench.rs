use tracing::info;

use super::classifier::Classifier;
use super::types::RunSummary;

/// Seed titles for the benchmark driver.
pub const SAMPLE_TITLES: [&str; 50] = [
    "Coca-Cola 6x33cl",
    "Eau minérale gazeuse 1.5L",
    "Yaourt nature 4x125g",
    "Beurre doux 250g",
    "Biscottes complètes",
    "Chips nature 150g",
    "Jus d’orange 1L",
    "Thé vert sachets",
    "Café moulu 250g",
    "Riz basmati 1kg",
    "Pâtes penne 500g",
    "Sauce tomate basilic",
    "Confiture fraise",
    "Miel d’acacia",
    "Chocolat noir 70%",
    "Biscuits apéritifs cacahuète",
    "Lait demi-écrémé 1L",
    "Fromage camembert 250g",
    "Sardines à l’huile",
    "Thon au naturel",
    "Haricots verts conserve",
    "Pois chiches bocal",
    "Huile d’olive vierge",
    "Vinaigre balsamique",
    "Moutarde de Dijon",
    "Mayonnaise",
    "Cornichons fins",
    "Sel fin iodé",
    "Poivre noir moulu",
    "Épices curry",
    "Farine de blé T55",
    "Sucre en poudre",
    "Levure chimique",
    "Pâtes à tartiner cacao",
    "Compote pomme gourde",
    "Sirop de grenadine",
    "Bâtonnets glacés",
    "Glace vanille bac",
    "Pizza surgelée 4 fromages",
    "Frites surgelées",
    "Poulet rôti",
    "Saucisse de Toulouse",
    "Steak haché frais",
    "Saumon fumé",
    "Oeufs x12",
    "Pain de mie complet",
    "Céréales chocolat",
    "Barres céréalières",
    "Litière chat compacte",
    "Croquettes chien adulte",
];

pub const DEFAULT_BENCH_SIZE: usize = 100;

/// `n` titles cycling through [`SAMPLE_TITLES`].
pub fn sample_titles(n: usize) -> Vec<String> {
    SAMPLE_TITLES
        .iter()
        .cycle()
        .take(n)
        .map(|t| t.to_string())
        .collect()
}

pub async fn run_benchmark(classifier: &Classifier, n: usize) -> RunSummary {
    let titles = sample_titles(n);
    let report = classifier.classify_batch(&titles).await;
    info!(
        count = report.summary.count,
        total_ms = report.summary.timings.total_ms,
        "Benchmark done"
    );
    report.summary
}
