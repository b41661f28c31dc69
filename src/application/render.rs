use crate::domain::model::book::Book;
use crate::domain::model::shelf::{Shelf, ShelfView};

/// 本棚を「未読」「読了」の2セクションのテキストに描画する。
pub fn render_shelf(shelf: &Shelf, query: &str) -> String {
    let view = shelf.view(query);
    let query = query.trim();

    let mut out = if query.is_empty() {
        format!("# Bookshelf ({} books)\n", shelf.len())
    } else {
        format!(
            "# Bookshelf ({} books, filter: \"{}\")\n",
            shelf.len(),
            query
        )
    };
    render_section(&mut out, "To read", &view.to_read);
    render_section(&mut out, "Completed", &view.completed);
    out
}

/// 1冊分の行（`[id] title — author (year)`）
pub fn book_line(book: &Book) -> String {
    format!(
        "[{}] {} — {} ({})",
        book.id(),
        book.title(),
        book.author(),
        book.year()
    )
}

fn render_section(out: &mut String, heading: &str, books: &[&Book]) {
    out.push_str(&format!("\n## {heading}\n"));
    if books.is_empty() {
        out.push_str("(none)\n");
        return;
    }
    for book in books {
        out.push_str(&format!("- {}\n", book_line(book)));
    }
}

/// 検索結果の件数サマリ（ヒット無しの案内を含む）
pub fn search_summary(view: &ShelfView<'_>, query: &str) -> Option<String> {
    if view.is_empty() {
        Some(format!("No books match \"{}\".", query.trim()))
    } else {
        None
    }
}
