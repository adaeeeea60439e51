use crate::models::Book;

pub const CARD_COVER: (u32, u32) = (400, 600);
pub const CART_COVER: (u32, u32) = (100, 150);
pub const DETAIL_COVER: (u32, u32) = (500, 750);

/// Placeholder image URL for a cover seed at the given size
pub fn cover_url(base: &str, seed: u32, (width, height): (u32, u32)) -> String {
    format!("{}/seed/{seed}/{width}/{height}", base.trim_end_matches('/'))
}

fn shelf_book(
    id: &str,
    title: &str,
    author: &str,
    description: &str,
    price: f64,
    genre: &str,
    cover_seed: u32,
) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        description: description.to_string(),
        price,
        genre: genre.to_string(),
        cover_seed,
        is_ai_recommended: false,
    }
}

/// The staff picks every session starts with
pub fn staff_picks() -> Vec<Book> {
    vec![
        shelf_book(
            "1",
            "The Midnight Library",
            "Matt Haig",
            "Between life and death there is a library, and within that library, the shelves go on forever. Every book provides a chance to try another life you could have lived.",
            24.99,
            "Fiction",
            101,
        ),
        shelf_book(
            "2",
            "Tomorrow, and Tomorrow, and Tomorrow",
            "Gabrielle Zevin",
            "In this exhilarating novel, two friends, often in love but never lovers, come together as creative partners in the world of video game design.",
            28.00,
            "Contemporary",
            102,
        ),
        shelf_book(
            "3",
            "Project Hail Mary",
            "Andy Weir",
            "Ryland Grace is the sole survivor on a desperate, last-chance mission, and if he fails, humanity and the earth itself will perish.",
            19.99,
            "Sci-Fi",
            103,
        ),
        shelf_book(
            "4",
            "Crying in H Mart",
            "Michelle Zauner",
            "A memoir about growing up Korean American, losing her mother, and forging her own identity.",
            17.95,
            "Memoir",
            104,
        ),
        shelf_book(
            "5",
            "The Song of Achilles",
            "Madeline Miller",
            "A tale of gods, kings, immortal fame, and the human heart, The Song of Achilles is a dazzling literary feat.",
            16.99,
            "Mythology",
            105,
        ),
        shelf_book(
            "6",
            "Dune",
            "Frank Herbert",
            "Set on the desert planet Arrakis, Dune is the story of the boy Paul Atreides, heir to a noble family tasked with ruling an inhospitable world.",
            22.50,
            "Sci-Fi",
            106,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_staff_picks_have_unique_ids() {
        let books = staff_picks();
        let ids: HashSet<_> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids.len(), books.len());
        assert!(books.iter().all(|b| !b.is_ai_recommended && b.price >= 0.0));
    }

    #[test]
    fn test_cover_url_strips_trailing_slash() {
        assert_eq!(
            cover_url("https://picsum.photos/", 101, CARD_COVER),
            "https://picsum.photos/seed/101/400/600"
        );
    }
}
