use crate::break_record::BreakRecord;
use crate::content::Content;
use crate::grid::mapping::map_containers;
use crate::grid::scoring::{best, score};
use crate::grid::{Grid, GridItem, ScoringFlags, sort_grids};
use crate::test_utils::{
    LINE_HEIGHT, article, build_content, column, container, grid_spec, para, single_column_grid,
};
use folio_types::{
    BoxMetrics, CapabilitySet, FigurePayload, GridItemSpec, GridSpec, Size, SourceElement,
    SourceFigure,
};

/// Five 200px columns in a grid that may grow from 200 to 600px.
fn fiver_spec(fixed_columns: &[usize]) -> GridSpec {
    GridSpec {
        name: "fiver".to_string(),
        size: BoxMetrics {
            outer_w: 1000.0,
            outer_h: 200.0,
            min_h: 200.0,
            max_h: 600.0,
            line_height: LINE_HEIGHT,
            ..Default::default()
        },
        items: (0..5)
            .map(|i| GridItemSpec::Column {
                height: 200.0,
                width: 200.0,
                min_height: 0.0,
                fixed: fixed_columns.contains(&i),
            })
            .collect(),
        ..Default::default()
    }
}

fn flagged(classes: &[&str]) -> Grid {
    let mut spec = grid_spec("flagged", 400.0, vec![column(400.0)]);
    spec.classes = classes.iter().map(|c| c.to_string()).collect();
    Grid::from_spec(&spec)
}

fn short_article() -> Content {
    build_content(&article(vec![para(40.0)]))
}

fn on_page(page_number: u32) -> BreakRecord {
    BreakRecord {
        page_number,
        ..Default::default()
    }
}

#[test]
fn test_stretch_grows_columns_within_bounds() {
    let mut grid = Grid::from_spec(&fiver_spec(&[]));
    assert!(grid.flexible);
    assert_eq!(grid.text_height, 1000.0);

    grid.stretch(500.0);
    assert_eq!(grid.text_height, 2500.0);
    assert_eq!(grid.max_col_height, 500.0);
    assert_eq!(grid.stretched_size.outer_h, 500.0);
    assert_eq!(grid.stretched_size.max_h, 560.0);

    grid.stretch(1000.0);
    assert_eq!(grid.text_height, 3000.0);
    assert_eq!(grid.max_col_height, 600.0);

    grid.stretch(100.0);
    assert_eq!(grid.text_height, 1000.0);
    assert_eq!(grid.max_col_height, 200.0);
}

#[test]
fn test_stretch_snaps_to_line_height() {
    let mut grid = Grid::from_spec(&fiver_spec(&[]));
    grid.stretch(510.0);
    assert_eq!(grid.max_col_height, 500.0);
}

#[test]
fn test_stretch_leaves_fixed_parts_alone() {
    let mut spec = fiver_spec(&[]);
    spec.classes.push("fixed".to_string());
    let mut grid = Grid::from_spec(&spec);
    assert!(!grid.flexible);
    assert_eq!(grid.size.min_h, 200.0);
    grid.stretch(500.0);
    assert_eq!(grid.text_height, 1000.0);

    let mut grid = Grid::from_spec(&fiver_spec(&[0, 2, 4]));
    grid.stretch(500.0);
    assert_eq!(grid.text_height, 1600.0);
    assert_eq!(grid.max_col_height, 500.0);
}

#[test]
fn test_mismatched_column_widths_invalidate_grid() {
    let spec = grid_spec(
        "bad",
        400.0,
        vec![
            column(400.0),
            GridItemSpec::Column {
                height: 400.0,
                width: 250.0,
                min_height: 0.0,
                fixed: false,
            },
        ],
    );
    let grid = Grid::from_spec(&spec);
    assert!(grid.invalid);
    assert!(best(&short_article(), &[grid], &BreakRecord::new()).is_none());
}

#[test]
fn test_items_keep_document_order() {
    let grid = Grid::from_spec(&grid_spec(
        "mixed",
        400.0,
        vec![column(400.0), container(200.0, &["one"], false), column(400.0)],
    ));
    assert_eq!(
        grid.items,
        vec![GridItem::Column(0), GridItem::Container(0), GridItem::Column(1)]
    );
    let after: Vec<_> = grid.items_after(GridItem::Container(0)).collect();
    assert_eq!(after, vec![GridItem::Column(1)]);
    assert_eq!(grid.containers[0].delta, 200.0);
}

#[test]
fn test_filters() {
    let mut spec = grid_spec("filtered", 200.0, vec![column(200.0)]);
    spec.size.min_h = 200.0;
    spec.size.max_h = 600.0;
    spec.classes = vec!["dark".to_string()];
    spec.requires = "canvas no-flash".parse().unwrap();
    let grid = Grid::from_spec(&spec);

    assert!(grid.size_filter(Size::new(300.0, 400.0)));
    assert!(grid.size_filter(Size::new(1000.0, 400.0)));
    assert!(!grid.size_filter(Size::new(200.0, 400.0)));
    assert!(!grid.size_filter(Size::new(300.0, 700.0)));
    assert!(!grid.size_filter(Size::new(300.0, 100.0)));

    assert!(grid.has_theme("dark"));
    assert!(!grid.has_theme("light"));
    assert!(grid.meets_requirements(&CapabilitySet::modern()));
    assert!(!grid.meets_requirements(&CapabilitySet::empty()));
}

#[test]
fn test_sort_prefers_wide_grids_with_containers() {
    let narrow = single_column_grid(400.0);
    let wide = Grid::from_spec(&grid_spec(
        "wide",
        400.0,
        vec![column(400.0), container(400.0, &["one"], false)],
    ));
    let mut grids = vec![narrow, wide];
    sort_grids(&mut grids);
    assert_eq!(grids[0].name, "wide");
    assert_eq!(grids[1].name, "single");
}

#[test]
fn test_scoring_flags_from_classes() {
    let flags = ScoringFlags::from_classes(&[
        "OnlyPage",
        "page-3",
        "no-page-2",
        "odd",
        "sizetocontainer",
        "page-x",
    ]);
    assert!(flags.onlypage);
    assert!(flags.odd);
    assert!(!flags.even);
    assert!(flags.size_to_container);
    assert_eq!(flags.pages.iter().copied().collect::<Vec<_>>(), vec![3]);
    assert_eq!(flags.non_pages.iter().copied().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn test_base_score_of_matching_grid() {
    let content = short_article();
    assert_eq!(score(&single_column_grid(400.0), &content, &BreakRecord::new()), 50.0);
}

#[test]
fn test_metric_mismatches() {
    let content = short_article();
    let br = BreakRecord::new();

    let mut spec = grid_spec("loose", 400.0, vec![column(400.0)]);
    spec.size.line_height = 10.0;
    spec.bonus = 100.0;
    assert_eq!(score(&Grid::from_spec(&spec), &content, &br), -1950.0);

    let spec = grid_spec(
        "narrow",
        400.0,
        vec![GridItemSpec::Column {
            height: 400.0,
            width: 250.0,
            min_height: 0.0,
            fixed: false,
        }],
    );
    assert_eq!(score(&Grid::from_spec(&spec), &content, &br), f32::NEG_INFINITY);
}

#[test]
fn test_page_targeting_scores() {
    let content = short_article();

    assert_eq!(score(&flagged(&["onlypage"]), &content, &on_page(0)), 4050.0);
    assert_eq!(score(&flagged(&["onlypage"]), &content, &on_page(1)), f32::NEG_INFINITY);
    assert_eq!(score(&flagged(&["firstpage"]), &content, &on_page(0)), 4050.0);
    assert_eq!(score(&flagged(&["firstpage"]), &content, &on_page(2)), f32::NEG_INFINITY);

    assert_eq!(score(&flagged(&["odd"]), &content, &on_page(0)), 2050.0);
    assert_eq!(score(&flagged(&["odd"]), &content, &on_page(1)), f32::NEG_INFINITY);
    assert_eq!(score(&flagged(&["even"]), &content, &on_page(0)), f32::NEG_INFINITY);
    assert_eq!(score(&flagged(&["even"]), &content, &on_page(1)), 2050.0);

    assert_eq!(score(&flagged(&["page-2"]), &content, &on_page(1)), 12050.0);
    assert_eq!(score(&flagged(&["page-2"]), &content, &on_page(0)), 50.0);
    assert_eq!(score(&flagged(&["no-page-1"]), &content, &on_page(0)), f32::NEG_INFINITY);
}

#[test]
fn test_bonus_only_for_eligible_grids() {
    let content = short_article();
    let mut spec = grid_spec("bonus", 400.0, vec![column(400.0)]);
    spec.bonus = 100.0;
    spec.classes = vec!["even".to_string()];
    let grid = Grid::from_spec(&spec);
    assert_eq!(score(&grid, &content, &on_page(1)), 2150.0);
    assert_eq!(score(&grid, &content, &on_page(0)), f32::NEG_INFINITY);
}

fn sized_figure(sizes: &[&str]) -> SourceFigure {
    SourceFigure::default().with_payload(FigurePayload::markup(sizes, "<img data-src=\"a.png\">"))
}

#[test]
fn test_containers_pick_figures_in_order() {
    let content = build_content(
        &article(vec![para(40.0)])
            .with_figure(sized_figure(&["one"]))
            .with_figure(sized_figure(&["five"]))
            .with_figure(sized_figure(&["bogus"]))
            .with_figure(sized_figure(&["one", "two", "three"]).with_class("required")),
    );
    let grid = Grid::from_spec(&grid_spec(
        "containers",
        400.0,
        vec![
            container(400.0, &["one"], true),
            container(400.0, &["one", "two"], true),
            container(400.0, &["one", "two", "three"], true),
            container(400.0, &["one", "two", "three", "four"], true),
            container(400.0, &["one", "two", "three", "four", "five"], true),
        ],
    ));

    let mut br = BreakRecord::new();
    let mapped: Vec<_> = map_containers(&content, &grid, &mut br)
        .into_iter()
        .map(|m| m.map(|m| (m.figure_index, m.size_name)))
        .collect();
    assert_eq!(
        mapped,
        vec![
            Some((0, "one".to_string())),
            Some((3, "two".to_string())),
            None,
            None,
            Some((1, "five".to_string())),
        ]
    );
    assert_eq!(br.figure_index, 4);
    assert_eq!(br.delayed, vec![2]);
}

#[test]
fn test_required_figure_blocks_forward_search() {
    let content = build_content(
        &article(vec![para(40.0)])
            .with_figure(sized_figure(&["big"]).with_class("required"))
            .with_figure(sized_figure(&["one"])),
    );
    let grid = Grid::from_spec(&grid_spec(
        "one",
        400.0,
        vec![column(400.0), container(200.0, &["one"], false)],
    ));
    let mut br = BreakRecord::new();
    let mapped = map_containers(&content, &grid, &mut br);
    assert_eq!(mapped, vec![None]);
    assert_eq!(br.figure_index, 0);
}

#[test]
fn test_flexible_container_respects_variant_min_height() {
    let figure = SourceFigure::default()
        .with_payload(FigurePayload::markup(&["one"], "<img>").with_min_height(300.0));
    let content = build_content(&article(vec![para(40.0)]).with_figure(figure));

    let flexible = Grid::from_spec(&grid_spec(
        "flex",
        400.0,
        vec![column(400.0), container(200.0, &["one"], false)],
    ));
    assert_eq!(map_containers(&content, &flexible, &mut BreakRecord::new()), vec![None]);

    let fixed = Grid::from_spec(&grid_spec(
        "fixed",
        400.0,
        vec![column(400.0), container(200.0, &["one"], true)],
    ));
    let mapped = map_containers(&content, &fixed, &mut BreakRecord::new());
    assert_eq!(mapped[0].as_ref().map(|m| m.figure_index), Some(0));
}

#[test]
fn test_best_prefers_filled_fixed_container() {
    let content = build_content(&article(vec![para(40.0)]).with_figure(sized_figure(&["one"])));
    let grids = vec![
        single_column_grid(400.0),
        Grid::from_spec(&grid_spec(
            "figure",
            400.0,
            vec![column(400.0), container(200.0, &["one"], true)],
        )),
    ];
    let br = BreakRecord::new();
    let selection = best(&content, &grids, &br).unwrap();

    assert_eq!(selection.grid, 1);
    let mapping = selection.containers[0].as_ref().unwrap();
    assert_eq!(mapping.figure_index, 0);
    assert_eq!(mapping.size_name, "one");
    // Scoring never touches the live record
    assert!(br.at_start());
}

#[test]
fn test_best_avoids_empty_fixed_container() {
    let content = short_article();
    let grids = vec![
        Grid::from_spec(&grid_spec(
            "figure",
            400.0,
            vec![column(400.0), container(200.0, &["one"], true)],
        )),
        single_column_grid(400.0),
    ];
    assert_eq!(best(&content, &grids, &BreakRecord::new()).unwrap().grid, 1);
}

#[test]
fn test_best_none_without_progress() {
    let content = short_article();
    let br = BreakRecord {
        index: 1,
        ..Default::default()
    };
    assert!(best(&content, &[single_column_grid(400.0)], &br).is_none());
}

#[test]
fn test_best_rejects_keeptogether_taller_than_columns() {
    let block = SourceElement::new("div")
        .with_class("keeptogether")
        .with_metrics(BoxMetrics::with_height(600.0, LINE_HEIGHT));
    let content = build_content(&article(vec![block]));
    assert!(best(&content, &[single_column_grid(400.0)], &BreakRecord::new()).is_none());
    assert!(best(&content, &[single_column_grid(600.0)], &BreakRecord::new()).is_some());
}

#[test]
fn test_best_disqualifies_grid_stalling_on_required_fallback() {
    let required = SourceFigure::default()
        .with_class("required")
        .with_payload(FigurePayload::element(&[], para(40.0)));
    let content = build_content(
        &article(vec![])
            .with_figure(required)
            .with_figure(sized_figure(&["one"])),
    );
    let mut br = BreakRecord::new();
    br.delay_figure(0);

    let containers_only = Grid::from_spec(&grid_spec(
        "containers",
        400.0,
        vec![container(400.0, &["one"], true)],
    ));
    assert!(best(&content, &[containers_only.clone()], &br).is_none());

    let grids = vec![containers_only, single_column_grid(400.0)];
    assert_eq!(best(&content, &grids, &br).unwrap().grid, 1);
}

#[test]
fn test_best_penalizes_mostly_empty_grids() {
    let content = short_article();
    let grids = vec![single_column_grid(2000.0), single_column_grid(400.0)];
    let selection = best(&content, &grids, &BreakRecord::new()).unwrap();
    assert_eq!(selection.grid, 1);
    // 50 + 40 - 4000 * 0.9^2
    assert!((selection.score - (50.0 + 40.0 - 3240.0)).abs() < 0.01);
}

#[test]
fn test_best_counts_overhang_as_placed() {
    let content = build_content(&article(vec![para(100.0), para(100.0)]));
    let br = BreakRecord {
        overhang: 60.0,
        ..Default::default()
    };
    let selection = best(&content, &[single_column_grid(400.0)], &br).unwrap();
    // Overhang takes capacity but is not scored again: 240 of 400 stay empty
    assert!((selection.score - (50.0 + 100.0 - 1440.0)).abs() < 0.01);
}

#[test]
fn test_best_scores_partial_fit_in_full() {
    let content = build_content(&article(vec![para(40.0), para(40.0)]));
    let grids = vec![single_column_grid(60.0), single_column_grid(200.0)];

    let short = best(&content, &grids[..1], &BreakRecord::new()).unwrap();
    // The second paragraph only partly fits but counts whole: 50 + 40 + 40
    assert!((short.score - 130.0).abs() < 0.01);

    let tall = best(&content, &grids[1..], &BreakRecord::new()).unwrap();
    // 120 of 200 stay empty: 50 + 80 - 4000 * 0.6^2
    assert!((tall.score - (130.0 - 1440.0)).abs() < 0.01);

    assert_eq!(best(&content, &grids, &BreakRecord::new()).unwrap().grid, 0);
}

#[test]
fn test_filled_container_discounts_emptiness() {
    let content = build_content(&article(vec![para(40.0)]).with_figure(sized_figure(&["one"])));
    let grid = Grid::from_spec(&grid_spec(
        "figure",
        400.0,
        vec![column(400.0), container(200.0, &["one"], true)],
    ));
    let selection = best(&content, &[grid], &BreakRecord::new()).unwrap();
    assert!(selection.containers[0].is_some());
    // Column, filled fixed container and text: 50 + 1000 + 5000 + 40,
    // then 360 of 400 empty with one filled container: 4000 * 0.9^2 * 0.8
    assert!((selection.score - (6090.0 - 2592.0)).abs() < 0.01);
}
