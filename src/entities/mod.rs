pub mod cycle_count;
pub mod cycle_count_item;
pub mod location;
pub mod pick_list;
pub mod pick_list_item;
pub mod pick_scan;
pub mod stock_movement;
pub mod stock_record;
