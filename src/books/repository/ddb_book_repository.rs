use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, Select, TransactWriteItem};
use chrono::Utc;

use crate::books::domain::model::BookEntity;
use crate::books::domain::normalize_title;
use crate::books::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::ddb::{from_ddb, parse_date_attribute, parse_item, parse_opt_number_attribute, parse_string_attribute, to_ddb_page};

// constant GSI partition value on row items; title markers omit it so the
// listing index only ever sees real rows
const REC_KIND: &str = "book";

// DDBBookRepository persists books in a single table: row items keyed by
// book_id plus `title#<normalized>` marker items that carry the uniqueness
// constraint. Markers and rows change together in one transaction so the
// store stays the arbiter of title uniqueness.
#[derive(Debug)]
pub struct DDBBookRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBBookRepository {
    pub fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }

    fn title_marker(title: &str) -> String {
        format!("title#{}", normalize_title(title))
    }

    fn row_item(&self, entity: &BookEntity) -> LibraryResult<HashMap<String, AttributeValue>> {
        let val = serde_json::to_value(entity)?;
        let mut item = parse_item(val)?;
        item.insert("rec_kind".to_string(), AttributeValue::S(REC_KIND.to_string()));
        Ok(item)
    }

    fn put_marker(&self, entity: &BookEntity) -> TransactWriteItem {
        let put = Put::builder()
            .table_name(self.table_name.as_str())
            .item("book_id", AttributeValue::S(Self::title_marker(entity.title.as_str())))
            .item("ref_id", AttributeValue::S(entity.book_id.to_string()))
            .condition_expression("attribute_not_exists(book_id)")
            .build();
        TransactWriteItem::builder().put(put).build()
    }

    fn delete_marker(&self, title: &str) -> TransactWriteItem {
        let delete = Delete::builder()
            .table_name(self.table_name.as_str())
            .key("book_id", AttributeValue::S(Self::title_marker(title)))
            .build();
        TransactWriteItem::builder().delete(delete).build()
    }
}

#[async_trait]
impl Repository<BookEntity> for DDBBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let put_row = Put::builder()
            .table_name(self.table_name.as_str())
            .set_item(Some(self.row_item(entity)?))
            .condition_expression("attribute_not_exists(book_id)")
            .build();
        self.client
            .transact_write_items()
            .transact_items(self.put_marker(entity))
            .transact_items(TransactWriteItem::builder().put(put_row).build())
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let old = self.get(entity.book_id.as_str()).await?;
        let mut updated = entity.clone();
        updated.updated_at = Utc::now().naive_utc();

        let put_row = Put::builder()
            .table_name(self.table_name.as_str())
            .set_item(Some(self.row_item(&updated)?))
            .condition_expression("attribute_exists(book_id)")
            .build();

        if normalize_title(old.title.as_str()) == normalize_title(entity.title.as_str()) {
            self.client
                .put_item()
                .table_name(self.table_name.as_str())
                .set_item(Some(self.row_item(&updated)?))
                .condition_expression("attribute_exists(book_id)")
                .send()
                .await.map(|_| 1).map_err(LibraryError::from)
        } else {
            // the title moved, so the marker moves inside the same transaction
            self.client
                .transact_write_items()
                .transact_items(self.delete_marker(old.title.as_str()))
                .transact_items(self.put_marker(&updated))
                .transact_items(TransactWriteItem::builder().put(put_row).build())
                .send()
                .await.map(|_| 1).map_err(LibraryError::from)
        }
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        self.client
            .get_item()
            .table_name(self.table_name.as_str())
            .key("book_id", AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await.map_err(LibraryError::from).and_then(|out| {
            match out.item() {
                Some(map) => Ok(map_to_book(map)),
                None => Err(LibraryError::not_found(
                    format!("book not found for {}", id).as_str())),
            }
        })
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let old = self.get(id).await?;
        let delete_row = Delete::builder()
            .table_name(self.table_name.as_str())
            .key("book_id", AttributeValue::S(id.to_string()))
            .build();
        self.client
            .transact_write_items()
            .transact_items(self.delete_marker(old.title.as_str()))
            .transact_items(TransactWriteItem::builder().delete(delete_row).build())
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }
}

#[async_trait]
impl BookRepository for DDBBookRepository {
    async fn find_latest(&self, page: Option<&str>,
                         page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let exclusive_start_key = to_ddb_page(page);
        self.client
            .query()
            .table_name(self.table_name.as_str())
            .index_name(self.index_name.as_str())
            .key_condition_expression("rec_kind = :rec_kind")
            .expression_attribute_values(":rec_kind", AttributeValue::S(REC_KIND.to_string()))
            .scan_index_forward(false)
            .consistent_read(false)
            .set_exclusive_start_key(exclusive_start_key)
            .limit(cmp::min(page_size, 500) as i32)
            .send()
            .await.map_err(LibraryError::from).map(|out| {
            let def_items = vec![];
            let items = out.items.as_ref().unwrap_or(&def_items);
            let records = items.iter().map(map_to_book).collect();
            from_ddb(page, page_size, out.last_evaluated_key(), records)
        })
    }

    async fn count_by_image(&self, image: &str) -> LibraryResult<usize> {
        let mut count = 0usize;
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        loop {
            let out = self.client
                .scan()
                .table_name(self.table_name.as_str())
                .filter_expression("image = :image")
                .expression_attribute_values(":image", AttributeValue::S(image.to_string()))
                .select(Select::Count)
                .set_exclusive_start_key(start_key)
                .send()
                .await.map_err(LibraryError::from)?;
            count += out.count() as usize;
            match out.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        Ok(count)
    }

    async fn find_by_title(&self, title: &str) -> LibraryResult<Option<BookEntity>> {
        let marker = self.client
            .get_item()
            .table_name(self.table_name.as_str())
            .key("book_id", AttributeValue::S(Self::title_marker(title)))
            .consistent_read(true)
            .send()
            .await.map_err(LibraryError::from)?;
        let ref_id = marker.item().and_then(|map| parse_string_attribute("ref_id", map));
        match ref_id {
            Some(id) => {
                match self.get(id.as_str()).await {
                    Ok(book) => Ok(Some(book)),
                    // a dangling marker behaves as no match
                    Err(LibraryError::NotFound { .. }) => Ok(None),
                    Err(other) => Err(other),
                }
            }
            None => Ok(None),
        }
    }
}

fn map_to_book(map: &HashMap<String, AttributeValue>) -> BookEntity {
    BookEntity {
        book_id: parse_string_attribute("book_id", map).unwrap_or_default(),
        title: parse_string_attribute("title", map).unwrap_or_default(),
        synopsis: parse_string_attribute("synopsis", map).unwrap_or_default(),
        isbn: parse_string_attribute("isbn", map),
        writer: parse_string_attribute("writer", map),
        category: parse_string_attribute("category", map),
        page_amount: parse_opt_number_attribute("page_amount", map),
        stock_amount: parse_opt_number_attribute("stock_amount", map),
        published: parse_string_attribute("published", map).unwrap_or_default(),
        image: parse_string_attribute("image", map).unwrap_or_default(),
        created_at: parse_date_attribute("created_at", map)
            .unwrap_or_else(|| Utc::now().naive_utc()),
        updated_at: parse_date_attribute("updated_at", map)
            .unwrap_or_else(|| Utc::now().naive_utc()),
    }
}
